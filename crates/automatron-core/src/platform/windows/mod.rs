//! Windows platform implementation

mod input;

pub use input::SendInputDriver;
