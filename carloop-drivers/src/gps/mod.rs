//! GPS receiver drivers

pub mod nmea;

pub use nmea::NmeaParser;
