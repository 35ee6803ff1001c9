//! Battery voltage monitor
//!
//! The vehicle battery reaches the ADC through a resistor divider. The
//! conversion is
//!
//! ```text
//! volts = raw * 3.3 / 4096 * divider_factor
//! ```
//!
//! The facade samples once per foreground tick and callers read the cached
//! value, so a reading is exactly as fresh as the last `update`.

use carloop_hal::adc::ADC_FULL_SCALE;
use carloop_hal::AnalogInput;

/// ADC reference voltage (V)
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;

/// Convert a raw ADC code into battery volts
pub fn raw_to_volts(raw: u16, factor: f32) -> f32 {
    raw as f32 * ADC_REFERENCE_VOLTS / ADC_FULL_SCALE as f32 * factor
}

/// Battery sense channel with a cached reading
pub struct BatteryMonitor<A> {
    adc: A,
    factor: f32,
    /// Last value stored by `update` (0.0 until the first update)
    voltage: f32,
}

impl<A: AnalogInput> BatteryMonitor<A> {
    /// Create a monitor for a divider of ratio `factor`
    pub fn new(adc: A, factor: f32) -> Self {
        Self {
            adc,
            factor,
            voltage: 0.0,
        }
    }

    /// Prepare the channel
    ///
    /// The first conversion after power-up is discarded to let the sample
    /// capacitor settle. The cache is not touched.
    pub fn enable(&mut self) {
        let _ = self.adc.read();
    }

    /// Take a fresh sample in volts
    pub fn read(&mut self) -> f32 {
        raw_to_volts(self.adc.read(), self.factor)
    }

    /// Sample and store the result in the cache
    pub fn update(&mut self) -> f32 {
        self.voltage = self.read();
        self.voltage
    }

    /// Last cached voltage
    pub fn voltage(&self) -> f32 {
        self.voltage
    }

    /// Divider ratio
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Get access to the ADC channel
    pub fn adc(&self) -> &A {
        &self.adc
    }
}
