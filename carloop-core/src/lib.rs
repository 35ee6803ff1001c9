//! Board-agnostic core logic for the Carloop vehicle telemetry board
//!
//! This crate contains the feature-lifecycle and concurrency engine that
//! sits between the board wiring and the applications:
//!
//! - Board revision constants and the requested/supported feature mask
//! - Power-rail sequencing with per-pin polarity
//! - CAN gateway with staged bit rate
//! - Battery ADC-to-voltage conversion and per-tick cache
//! - GPS serial ingest task sharing parser state under a mutex
//! - The [`Carloop`] facade composing all of the above

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod battery;
pub mod can;
pub mod carloop;
pub mod config;
pub mod features;
pub mod gps;
pub mod power;

#[cfg(test)]
pub(crate) mod mock;

pub use carloop::{BoardIo, Carloop, CarloopParts};
pub use config::{BoardConfig, CARLOOP_REVISION_2};
pub use features::{FeatureGate, Features};
