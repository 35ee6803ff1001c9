//! Power-rail sequencing
//!
//! The CAN transceiver and the GPS receiver each sit behind a load switch
//! driven by one GPIO. Revision 2 uses an active-low switch for CAN and an
//! active-high one for GPS, so the rail tracks the logical state and maps
//! it onto the pin level.

use carloop_hal::{Level, OutputPin};

/// One switched power rail
pub struct PowerRail<P> {
    pin: P,
    /// Level that powers the rail
    active: Level,
    /// Current logical state (true = powered)
    enabled: bool,
}

impl<P: OutputPin> PowerRail<P> {
    /// Create a rail and drive it to the inactive level
    pub fn new(pin: P, active: Level) -> Self {
        let mut rail = Self {
            pin,
            active,
            enabled: false,
        };
        // Ensure the rail starts unpowered
        rail.disable();
        rail
    }

    /// Power the rail
    pub fn enable(&mut self) {
        self.pin.set_level(self.active);
        self.enabled = true;
    }

    /// Cut power to the rail
    pub fn disable(&mut self) {
        self.pin.set_level(!self.active);
        self.enabled = false;
    }

    /// Check if the rail is powered
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get access to the underlying pin
    pub fn pin(&self) -> &P {
        &self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn test_active_high_rail() {
        let mut rail = PowerRail::new(MockPin::new(), Level::High);

        // Initially off
        assert!(!rail.is_enabled());
        assert!(!rail.pin().is_set_high());

        rail.enable();
        assert!(rail.is_enabled());
        assert!(rail.pin().is_set_high());

        rail.disable();
        assert!(!rail.is_enabled());
        assert!(!rail.pin().is_set_high());
    }

    #[test]
    fn test_active_low_rail() {
        let mut rail = PowerRail::new(MockPin::new(), Level::Low);

        // Initially off (pin is high for active-low)
        assert!(rail.pin().is_set_high());

        rail.enable();
        assert!(!rail.pin().is_set_high());

        rail.disable();
        assert!(rail.pin().is_set_high());
    }

    #[test]
    fn test_enable_is_idempotent() {
        let mut rail = PowerRail::new(MockPin::new(), Level::Low);
        rail.enable();
        rail.enable();
        assert!(rail.is_enabled());
        assert_eq!(rail.pin().level(), Level::Low);
    }
}
