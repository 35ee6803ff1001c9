//! Analog input abstraction
//!
//! The battery sense line is sampled through a 12-bit ADC.

/// Full-scale code count of a 12-bit converter
pub const ADC_FULL_SCALE: u16 = 4096;

/// Single analog input channel
pub trait AnalogInput {
    /// Take one raw sample (0 to `ADC_FULL_SCALE - 1`)
    ///
    /// Takes `&mut self` because ADC conversions require exclusive access
    /// to the converter.
    fn read(&mut self) -> u16;
}
