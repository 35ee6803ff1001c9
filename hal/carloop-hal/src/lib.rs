//! Carloop Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the Carloop core is written
//! against. Chip-specific HALs (STM32F2 for the Photon/P1 family) implement
//! them, and host tests implement them with mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (carloop-firmware, etc.)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  carloop-core (feature lifecycle)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  carloop-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  carloop-hal-stm32f2                    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Power-enable pins
//! - [`adc::AnalogInput`] - Battery voltage sense
//! - [`serial::SerialPort`] - GPS receiver byte stream
//! - [`can::CanChannel`] - CAN transceiver

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod can;
pub mod gpio;
pub mod serial;

// Re-export key traits at crate root for convenience
pub use adc::AnalogInput;
pub use can::{CanChannel, CanError, CanMessage};
pub use gpio::{Level, OutputPin};
pub use serial::SerialPort;
