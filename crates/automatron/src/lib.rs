//! # AUTOMATRON
//!
//! Record what a person does at the desktop, replay it like a person would.
//!
//! ## Features
//!
//! - **Recording**: keystrokes coalesced into text, clicks vs drags, scroll bursts
//! - **Replay**: curved cursor paths, randomized pauses, retry on transient failures
//! - **Chains**: several recordings in order, each looped
//! - **Dry run**: replay against a driver that only logs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use automatron::prelude::*;
//!
//! let sequence = SequenceStore::load("sequences/login.json")?;
//!
//! let executor = ActionExecutor::new(DryRunDriver::new(), SystemClock::new(), PlaybackConfig::default());
//! let mut player = SequencePlayer::new(executor);
//! let report = player.play(&sequence)?;
//! println!("{} actions replayed", report.executed);
//! # Ok::<(), anyhow::Error>(())
//! ```

// Re-export core primitives
pub use automatron_core::*;

// Re-export recorder module
pub use automatron_recorder as recorder;

pub use automatron_recorder::{
    Action, ActionEntry, ActionExecutor, ActionKind, AutomatronConfig, CaptureConfig,
    CaptureSession, ChainConfig, ChainItem, ChainOrchestrator, ChainReport, PlaybackConfig,
    PlaybackReport, Playbook, Sequence, SequencePlayer, SequenceStore,
};

/// Prelude - import everything you need
pub mod prelude {
    pub use automatron_core::prelude::*;
    pub use automatron_recorder::prelude::*;
}
