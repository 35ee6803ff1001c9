//! STM32F2-specific HAL for the Carloop firmware
//!
//! Implements the `carloop-hal` traits on top of embassy-stm32 for the
//! STM32F205 inside the Particle Photon and P1 modules:
//!
//! - [`can::BxCanChannel`]: bxCAN controller as a [`carloop_hal::CanChannel`]
//! - [`adc::AdcInput`]: one ADC channel as a [`carloop_hal::AnalogInput`]
//! - [`serial::gps_serial`]: buffered UART receiver as a [`carloop_hal::SerialPort`]
//!
//! Digital outputs need no wrapper: embassy `Output` pins go through
//! [`carloop_hal::gpio::EhOutputPin`].
//!
//! # Features
//!
//! - `stm32f205rg` - Enable support for the Photon/P1 MCU
//! - `defmt` - Enable debug formatting support

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod can;
pub mod serial;
