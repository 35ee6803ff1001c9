//! GPS subsystem
//!
//! The receiver streams NMEA over a UART. A background ingest task drains
//! the UART into the parser collaborator while holding the same lock that
//! foreground readers take, so a multi-field read never mixes two
//! sentences.
//!
//! ```text
//!   UART ──► SharedGps { serial, parser } ◄── foreground lock(|gps| ..)
//!                 ▲
//!                 │ lock, drain, unlock, sleep 1 ms
//!            ingest::run (background task)
//! ```

pub mod ingest;
pub mod parser;
pub mod shared;

pub use ingest::{GpsIngestTask, IngestSpawner, IngestState, SpawnError, INGEST_INTERVAL_US};
pub use parser::{GpsDate, GpsParser, GpsSnapshot, GpsTime, Location};
pub use shared::SharedGps;
