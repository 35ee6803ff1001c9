//! GPIO pin abstractions
//!
//! Provides the digital output trait used by the power sequencer, plus an
//! adapter for any `embedded-hal` 1.0 output pin whose operations cannot
//! fail.

use core::convert::Infallible;
use core::ops::Not;

/// Logic level of a digital pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Digital output pin
///
/// Pin writes are assumed to always succeed; there is nothing software can
/// do about a failed GPIO register write.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Drive the pin to a specific level
    fn set_level(&mut self, level: Level) {
        match level {
            Level::High => self.set_high(),
            Level::Low => self.set_low(),
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Current output level
    fn level(&self) -> Level {
        Level::from(self.is_set_high())
    }
}

/// Adapter for `embedded-hal` output pins
///
/// `embedded_hal::digital::StatefulOutputPin` needs `&mut self` to read back
/// its state, so the adapter keeps a shadow of the last written level.
pub struct EhOutputPin<P> {
    pin: P,
    high: bool,
}

impl<P> EhOutputPin<P>
where
    P: embedded_hal::digital::OutputPin<Error = Infallible>,
{
    /// Wrap a pin whose current level is `initial`
    pub fn new(pin: P, initial: Level) -> Self {
        Self {
            pin,
            high: initial == Level::High,
        }
    }

    /// Release the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

fn infallible(result: Result<(), Infallible>) {
    if let Err(never) = result {
        match never {}
    }
}

impl<P> OutputPin for EhOutputPin<P>
where
    P: embedded_hal::digital::OutputPin<Error = Infallible>,
{
    fn set_high(&mut self) {
        infallible(self.pin.set_high());
        self.high = true;
    }

    fn set_low(&mut self) {
        infallible(self.pin.set_low());
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EhMockPin {
        writes: u8,
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for EhMockPin {
        type Error = Infallible;
    }

    impl embedded_hal::digital::OutputPin for EhMockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.writes += 1;
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.writes += 1;
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn test_level_complement() {
        assert_eq!(!Level::High, Level::Low);
        assert_eq!(!Level::Low, Level::High);
        assert_eq!(Level::from(true), Level::High);
    }

    #[test]
    fn test_eh_adapter_tracks_level() {
        let mut pin = EhOutputPin::new(
            EhMockPin {
                writes: 0,
                high: true,
            },
            Level::High,
        );
        assert_eq!(pin.level(), Level::High);

        pin.set_level(Level::Low);
        assert!(!pin.is_set_high());

        pin.set_high();
        assert_eq!(pin.level(), Level::High);

        let inner = pin.into_inner();
        assert!(inner.high);
        assert_eq!(inner.writes, 2);
    }
}
