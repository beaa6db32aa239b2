//! Platform input drivers
//!
//! Windows injects through `SendInput`. macOS and Linux use enigo when the
//! `native` feature is enabled. Without a native driver, [`native_driver`]
//! fails with `Unsupported` and callers fall back to a dry run.

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(all(not(target_os = "windows"), feature = "native"))]
pub mod enigo_driver;

use crate::driver::InputDriver;
use crate::Result;

/// The OS driver for this build.
pub fn native_driver() -> Result<Box<dyn InputDriver>> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::SendInputDriver::new()))
    }

    #[cfg(all(not(target_os = "windows"), feature = "native"))]
    {
        Ok(Box::new(enigo_driver::EnigoDriver::new()?))
    }

    #[cfg(all(not(target_os = "windows"), not(feature = "native")))]
    {
        Err(crate::Error::unsupported(
            "No native input driver in this build (enable the `native` feature)",
        ))
    }
}
