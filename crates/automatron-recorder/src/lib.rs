//! automatron-recorder - record desktop input, replay it like a person would
//!
//! Recording turns raw pointer and keyboard events into a compact list of
//! actions (typed text, clicks, drags, scroll bursts, shortcuts). Playback
//! drives an [`InputDriver`](automatron_core::InputDriver) with randomized
//! pauses and curved cursor paths. Chains loop several recordings in order.
//!
//! ## Platform Support
//!
//! - **Recording**: rdev global hook, behind the `native` feature
//! - **Playback**: any `InputDriver`; see `automatron_core::platform`

pub mod actions;
pub mod capture;
pub mod chain;
pub mod config;
pub mod platform;
pub mod player;
pub mod sequence;
pub mod storage;

pub use actions::{Action, ActionKind, ClipboardOp, ScrollAction, ScrollDirection};
pub use capture::{CaptureSession, EventCapture, EventSender, RawEvent, RawKey, TimedEvent};
pub use chain::{
    ChainConfig, ChainItem, ChainOrchestrator, ChainReport, ItemOutcome, LoopOutcome, Playbook,
};
pub use config::{AutomatronConfig, CaptureConfig, PlaybackConfig};
pub use player::{ActionExecutor, PlaybackReport, SequencePlayer};
pub use sequence::{ActionEntry, Sequence, SequenceMetadata};
pub use storage::SequenceStore;

pub mod prelude {
    pub use crate::actions::{Action, ActionKind, ClipboardOp, ScrollAction};
    pub use crate::capture::{CaptureSession, EventCapture, RawEvent, RawKey, TimedEvent};
    pub use crate::chain::{ChainConfig, ChainItem, ChainOrchestrator, ChainReport, Playbook};
    pub use crate::config::{AutomatronConfig, CaptureConfig, PlaybackConfig};
    pub use crate::player::{ActionExecutor, PlaybackReport, SequencePlayer};
    pub use crate::sequence::{ActionEntry, Sequence, SequenceMetadata};
    pub use crate::storage::SequenceStore;
}
