//! Embassy async tasks
//!
//! The GPS ingest task is the only background task; the applications run
//! on the main task.

pub mod gps;
#[cfg(feature = "slcan")]
pub mod usb;

pub use gps::{gps_ingest_task, EmbassyIngestSpawner};
