//! automatron-core - input primitives for desktop record/replay
//!
//! The [`InputDriver`] capability, named keys, the cursor motion model,
//! retry with backoff, and the structured error type shared by the
//! recorder and the CLI.
//!
//! ## Platform Support
//!
//! - **Windows**: `SendInput`
//! - **macOS / Linux**: enigo, behind the `native` feature
//! - **Everywhere**: [`DryRunDriver`] for previews and tests

pub mod clock;
pub mod driver;
pub mod error;
pub mod keys;
pub mod motion;
pub mod platform;
pub mod retry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{
    DriverCall, DriverLog, DryRunDriver, InputDriver, MouseButton, Point, ScrollCarry,
};
pub use error::{Error, ErrorCode, Result};
pub use keys::Key;
pub use retry::RetryPolicy;

pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::driver::{DryRunDriver, InputDriver, MouseButton, Point};
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::keys::Key;
    pub use crate::retry::RetryPolicy;
}
