//! NMEA 0183 sentence parser
//!
//! Decodes `$xxRMC` and `$xxGGA` sentences one byte at a time. Sentence
//! layout:
//!
//! ```text
//! $GPRMC,hhmmss.ss,A,ddmm.mmmm,N,dddmm.mmmm,E,knots,course,ddmmyy,...*CS\r\n
//! $GPGGA,hhmmss.ss,ddmm.mmmm,N,dddmm.mmmm,E,quality,sats,hdop,alt,M,...*CS\r\n
//! ```
//!
//! Every field is staged while the sentence streams in and only committed
//! once the XOR checksum after `*` verifies. A corrupted sentence leaves
//! the previous fix untouched and bumps the failure counter.

use carloop_core::gps::{GpsDate, GpsParser, GpsTime, Location};
use heapless::Vec;

/// Longest term kept; longer terms are truncated
const MAX_TERM_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sentence {
    Rmc,
    Gga,
    Other,
}

/// Fields decoded from the sentence in progress
#[derive(Debug, Clone, Copy, Default)]
struct Staged {
    lat: Option<f64>,
    south: bool,
    lng: Option<f64>,
    west: bool,
    date: Option<GpsDate>,
    time: Option<GpsTime>,
    has_fix: bool,
}

/// Byte-fed NMEA parser
pub struct NmeaParser {
    /// Between `$` and the end of the sentence
    active: bool,
    parity: u8,
    in_checksum: bool,
    term: Vec<u8, MAX_TERM_LEN>,
    term_number: u8,
    sentence: Sentence,
    staged: Staged,

    location: Location,
    date: GpsDate,
    time: GpsTime,

    chars: u32,
    passed: u32,
    failed: u32,
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaParser {
    /// Create a parser with no fix
    pub const fn new() -> Self {
        Self {
            active: false,
            parity: 0,
            in_checksum: false,
            term: Vec::new(),
            term_number: 0,
            sentence: Sentence::Other,
            staged: Staged {
                lat: None,
                south: false,
                lng: None,
                west: false,
                date: None,
                time: None,
                has_fix: false,
            },
            location: Location {
                lat: 0.0,
                lng: 0.0,
                valid: false,
            },
            date: GpsDate {
                year: 0,
                month: 0,
                day: 0,
                valid: false,
            },
            time: GpsTime {
                hour: 0,
                minute: 0,
                second: 0,
                centisecond: 0,
                valid: false,
            },
            chars: 0,
            passed: 0,
            failed: 0,
        }
    }

    fn start_sentence(&mut self) {
        self.active = true;
        self.parity = 0;
        self.in_checksum = false;
        self.term.clear();
        self.term_number = 0;
        self.sentence = Sentence::Other;
        self.staged = Staged::default();
    }

    /// Drop the sentence state; bytes are ignored until the next `$`
    fn go_idle(&mut self) {
        self.start_sentence();
        self.active = false;
    }

    /// Handle a complete term; returns true if a sentence was committed
    fn end_term(&mut self) -> bool {
        if self.in_checksum {
            return self.end_sentence();
        }

        if self.term_number == 0 {
            self.sentence = sentence_type(&self.term);
            return false;
        }

        if self.term.is_empty() {
            return false;
        }

        let term = self.term.as_slice();
        let staged = &mut self.staged;
        match (self.sentence, self.term_number) {
            (Sentence::Rmc, 1) | (Sentence::Gga, 1) => staged.time = parse_time(term),
            (Sentence::Rmc, 2) => staged.has_fix = term[0] == b'A',
            (Sentence::Rmc, 3) | (Sentence::Gga, 2) => staged.lat = parse_degrees(term),
            (Sentence::Rmc, 4) | (Sentence::Gga, 3) => staged.south = term[0] == b'S',
            (Sentence::Rmc, 5) | (Sentence::Gga, 4) => staged.lng = parse_degrees(term),
            (Sentence::Rmc, 6) | (Sentence::Gga, 5) => staged.west = term[0] == b'W',
            (Sentence::Rmc, 9) => staged.date = parse_date(term),
            (Sentence::Gga, 6) => staged.has_fix = term[0] > b'0',
            _ => {}
        }
        false
    }

    fn end_sentence(&mut self) -> bool {
        let checksum = match (self.term.first(), self.term.get(1)) {
            (Some(&hi), Some(&lo)) => hex_value(hi).zip(hex_value(lo)).map(|(h, l)| (h << 4) | l),
            _ => None,
        };

        if checksum != Some(self.parity) {
            self.failed = self.failed.wrapping_add(1);
            return false;
        }
        self.passed = self.passed.wrapping_add(1);

        if self.sentence == Sentence::Other {
            return false;
        }

        let staged = self.staged;
        if let Some(time) = staged.time {
            self.time = time;
        }
        if let Some(date) = staged.date {
            self.date = date;
        }
        if staged.has_fix {
            if let (Some(lat), Some(lng)) = (staged.lat, staged.lng) {
                self.location = Location {
                    lat: if staged.south { -lat } else { lat },
                    lng: if staged.west { -lng } else { lng },
                    valid: true,
                };
            }
        }
        true
    }
}

impl GpsParser for NmeaParser {
    fn encode(&mut self, byte: u8) -> bool {
        self.chars = self.chars.wrapping_add(1);

        match byte {
            b'$' => {
                self.start_sentence();
                false
            }
            _ if !self.active => false,
            b',' | b'*' | b'\r' | b'\n' => {
                if byte == b',' {
                    self.parity ^= byte;
                }
                let checksum_term = self.in_checksum;
                let committed = self.end_term();
                if checksum_term || matches!(byte, b'\r' | b'\n') {
                    self.go_idle();
                    return committed;
                }
                self.term_number = self.term_number.saturating_add(1);
                self.term.clear();
                self.in_checksum = byte == b'*';
                committed
            }
            _ => {
                let _ = self.term.push(byte);
                if !self.in_checksum {
                    self.parity ^= byte;
                }
                false
            }
        }
    }

    fn location(&self) -> Location {
        self.location
    }

    fn date(&self) -> GpsDate {
        self.date
    }

    fn time(&self) -> GpsTime {
        self.time
    }

    fn chars_processed(&self) -> u32 {
        self.chars
    }

    fn failed_checksum(&self) -> u32 {
        self.failed
    }

    fn passed_checksum(&self) -> u32 {
        self.passed
    }
}

fn sentence_type(term: &[u8]) -> Sentence {
    match term {
        b"GPRMC" | b"GNRMC" => Sentence::Rmc,
        b"GPGGA" | b"GNGGA" => Sentence::Gga,
        _ => Sentence::Other,
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn two_digits(term: &[u8]) -> Option<u8> {
    match term {
        [a @ b'0'..=b'9', b @ b'0'..=b'9', ..] => Some((a - b'0') * 10 + (b - b'0')),
        _ => None,
    }
}

/// `ddmm.mmmm` or `dddmm.mmmm` to decimal degrees
fn parse_degrees(term: &[u8]) -> Option<f64> {
    let digits = term.iter().filter(|c| c.is_ascii_digit()).count();
    let dots = term.iter().filter(|&&c| c == b'.').count();
    if digits == 0 || dots > 1 || digits + dots != term.len() {
        return None;
    }

    let value: f64 = core::str::from_utf8(term).ok()?.parse().ok()?;
    let whole_degrees = (value as u32) / 100;
    let minutes = value - (whole_degrees * 100) as f64;
    Some(whole_degrees as f64 + minutes / 60.0)
}

/// `hhmmss` with optional `.ss`
fn parse_time(term: &[u8]) -> Option<GpsTime> {
    let hour = two_digits(term)?;
    let minute = two_digits(term.get(2..)?)?;
    let second = two_digits(term.get(4..)?)?;
    let centisecond = match term.get(6..) {
        Some([b'.', rest @ ..]) => two_digits(rest).unwrap_or(0),
        _ => 0,
    };

    if hour > 23 || minute > 59 || second > 60 {
        return None;
    }

    Some(GpsTime {
        hour,
        minute,
        second,
        centisecond,
        valid: true,
    })
}

/// `ddmmyy`
fn parse_date(term: &[u8]) -> Option<GpsDate> {
    let day = two_digits(term)?;
    let month = two_digits(term.get(2..)?)?;
    let year = two_digits(term.get(4..)?)?;

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }

    Some(GpsDate {
        year: 2000 + year as u16,
        month,
        day,
        valid: true,
    })
}
