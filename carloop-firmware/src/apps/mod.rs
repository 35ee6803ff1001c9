//! Foreground applications
//!
//! Exactly one runs after board bring-up, picked at build time.

#[cfg(feature = "slcan")]
pub mod slcan;
#[cfg(not(feature = "slcan"))]
pub mod telemetry;
