//! ADC input for STM32F2
//!
//! The battery divider has a high source impedance, so every conversion
//! uses the longest sample time.

use carloop_hal::AnalogInput;
use embassy_stm32::adc::{Adc, AdcChannel, Instance, SampleTime};

/// One ADC channel bound to its converter
pub struct AdcInput<'d, T: Instance, P> {
    adc: Adc<'d, T>,
    pin: P,
}

impl<'d, T: Instance, P: AdcChannel<T>> AdcInput<'d, T, P> {
    pub fn new(mut adc: Adc<'d, T>, pin: P) -> Self {
        adc.set_sample_time(SampleTime::CYCLES480);
        Self { adc, pin }
    }
}

impl<T: Instance, P: AdcChannel<T>> AnalogInput for AdcInput<'_, T, P> {
    fn read(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.pin)
    }
}
