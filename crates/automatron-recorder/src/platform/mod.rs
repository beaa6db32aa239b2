//! OS event sources for recording
//!
//! With the `native` feature, a global rdev hook feeds pointer and keyboard
//! events into a [`CaptureSession`](crate::capture::CaptureSession).

#[cfg(feature = "native")]
mod listener;

use crate::capture::EventSender;
use automatron_core::Result;

/// Start the global input hook on a background thread.
pub fn spawn_listener(sender: EventSender) -> Result<()> {
    #[cfg(feature = "native")]
    {
        listener::spawn(sender)
    }

    #[cfg(not(feature = "native"))]
    {
        drop(sender);
        Err(automatron_core::Error::unsupported(
            "Recording needs the `native` feature",
        ))
    }
}
