//! Peripheral driver implementations
//!
//! Concrete collaborators for the contracts defined in carloop-core:
//!
//! - GPS sentence parser (NMEA 0183 RMC and GGA)

#![no_std]
#![deny(unsafe_code)]

pub mod gps;
