//! Board revision constants
//!
//! Each physical revision of the Carloop gets one [`BoardConfig`] value:
//! pin assignments, enable-pin polarities, default bus rates and the
//! battery divider calibration. The firmware picks one at build time and
//! hands it to the facade.

use carloop_hal::Level;

use crate::features::Features;

/// Photon/P1 pin names as printed on the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pin {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
}

/// CAN transceiver pin pairs available on the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanPins {
    /// CAN2 on D1 (TX) / D2 (RX)
    D1D2,
}

/// Power-enable pin with its active level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnablePin {
    /// Module pin
    pub pin: Pin,
    /// Level that powers the subsystem
    pub active: Level,
}

impl EnablePin {
    /// Create an active-high enable pin
    pub const fn active_high(pin: Pin) -> Self {
        Self {
            pin,
            active: Level::High,
        }
    }

    /// Create an active-low enable pin
    pub const fn active_low(pin: Pin) -> Self {
        Self {
            pin,
            active: Level::Low,
        }
    }

    /// Level that cuts power to the subsystem
    pub fn inactive(&self) -> Level {
        !self.active
    }
}

/// Complete board revision description
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// Revision name for logs
    pub name: &'static str,
    /// CAN transceiver pins
    pub can_pins: CanPins,
    /// CAN bit rate used until `set_can_speed` is called (bits/s)
    pub can_default_speed: u32,
    /// Battery sense ADC pin
    pub battery_pin: Pin,
    /// Resistor divider ratio from battery to ADC pin
    pub battery_factor: f32,
    /// CAN transceiver power enable
    pub can_enable: EnablePin,
    /// GPS receiver power enable
    pub gps_enable: EnablePin,
    /// GPS UART baud rate
    pub gps_baud_rate: u32,
    /// Subsystems physically present on this revision
    pub features: Features,
}

/// Carloop revision 2
pub const CARLOOP_REVISION_2: BoardConfig = BoardConfig {
    name: "carloop-r2",
    can_pins: CanPins::D1D2,
    can_default_speed: 500_000,
    battery_pin: Pin::A1,
    battery_factor: 7.2,
    can_enable: EnablePin::active_low(Pin::D0),
    gps_enable: EnablePin::active_high(Pin::A0),
    gps_baud_rate: 9600,
    features: Features::ALL,
};
