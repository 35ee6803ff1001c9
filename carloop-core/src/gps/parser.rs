//! GPS parser collaborator contract
//!
//! The sentence grammar belongs to the parser implementation. The core
//! only needs a byte-at-a-time `encode` and the fix accessors.

/// Position fix
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Location {
    /// Latitude in decimal degrees (north positive)
    pub lat: f64,
    /// Longitude in decimal degrees (east positive)
    pub lng: f64,
    /// A fix has been committed
    pub valid: bool,
}

impl Location {
    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// UTC calendar date of the fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub valid: bool,
}

impl GpsDate {
    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// UTC time of day of the fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub centisecond: u8,
    pub valid: bool,
}

impl GpsTime {
    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    pub fn centisecond(&self) -> u8 {
        self.centisecond
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Byte-fed GPS sentence decoder
///
/// Implementations must absorb malformed input: a bad sentence bumps
/// `failed_checksum` and leaves the last committed fix in place.
pub trait GpsParser {
    /// Feed one byte; returns true when it completed a valid sentence
    fn encode(&mut self, byte: u8) -> bool;

    /// Last committed position
    fn location(&self) -> Location;

    /// Last committed date
    fn date(&self) -> GpsDate;

    /// Last committed time
    fn time(&self) -> GpsTime;

    /// Total bytes fed to `encode`
    fn chars_processed(&self) -> u32;

    /// Sentences rejected by checksum
    fn failed_checksum(&self) -> u32;

    /// Sentences accepted by checksum
    fn passed_checksum(&self) -> u32;
}

/// Consistent copy of every parser field
///
/// Captured under the GPS lock, so all fields come from the same state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsSnapshot {
    pub location: Location,
    pub date: GpsDate,
    pub time: GpsTime,
    pub chars_processed: u32,
    pub failed_checksum: u32,
    pub passed_checksum: u32,
}

impl GpsSnapshot {
    /// Copy all fields out of a parser
    pub fn capture<P: GpsParser>(parser: &P) -> Self {
        Self {
            location: parser.location(),
            date: parser.date(),
            time: parser.time(),
            chars_processed: parser.chars_processed(),
            failed_checksum: parser.failed_checksum(),
            passed_checksum: parser.passed_checksum(),
        }
    }
}
