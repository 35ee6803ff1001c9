//! Feature masking
//!
//! A board revision declares which subsystems it physically carries; the
//! application requests a subset at `begin`. Only the intersection is ever
//! powered. An unsupported or unrequested subsystem simply reports
//! inactive, it is never an error.

use core::ops::{BitAnd, BitOr};

/// Bitmask over the Carloop subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Features(u8);

impl Features {
    /// No subsystems
    pub const NONE: Features = Features(0);
    /// CAN transceiver
    pub const CAN: Features = Features(1);
    /// GPS receiver
    pub const GPS: Features = Features(2);
    /// Battery voltage sense
    pub const BATTERY: Features = Features(4);
    /// Every subsystem
    pub const ALL: Features = Features(1 | 2 | 4);

    /// Build from raw bits, dropping unknown ones
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Features(bits & Self::ALL.0)
    }

    /// Raw bit value
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if every bit of `other` is set in `self`
    pub const fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no bits are set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        Features(self.0 | rhs.0)
    }
}

impl BitAnd for Features {
    type Output = Features;

    fn bitand(self, rhs: Features) -> Features {
        Features(self.0 & rhs.0)
    }
}

/// Requested features masked by what the board supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeatureGate {
    supported: Features,
    requested: Features,
}

impl FeatureGate {
    /// Create a gate for a board's supported set
    ///
    /// Nothing is requested until [`request`](Self::request) is called, so
    /// every query reports inactive before `begin`.
    pub const fn new(supported: Features) -> Self {
        Self {
            supported,
            requested: Features::NONE,
        }
    }

    /// Record the caller's requested set
    pub fn request(&mut self, requested: Features) {
        self.requested = requested;
    }

    /// Is `capability` both supported and requested
    pub const fn has(&self, capability: Features) -> bool {
        self.supported.0 & self.requested.0 & capability.0 != 0
    }

    /// The effective (masked) feature set
    pub fn active(&self) -> Features {
        self.supported & self.requested
    }

    /// The caller's raw request
    pub fn requested(&self) -> Features {
        self.requested
    }
}
