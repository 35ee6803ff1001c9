//! SLCAN ASCII CAN bridge
//!
//! Commands from the host, one per `\r`-terminated line:
//!
//! ```text
//! O                   open the CAN channel
//! C                   close the CAN channel
//! Sn                  bit rate for the next open, n = 0..8
//! tiiildd..           transmit standard frame (3 hex id, 1 digit len)
//! Tiiiiiiiildd..      transmit extended frame (8 hex id)
//! riiil               transmit standard remote frame (no data)
//! Riiiiiiiil          transmit extended remote frame
//! ```
//!
//! Received frames are reported in the same `t`/`T`/`r`/`R` form,
//! lowercase hex, terminated by `\r`.

use carloop_hal::can::MAX_DATA_LEN;
use carloop_hal::{CanError, CanMessage};
use heapless::Vec;

/// Line terminator
pub const LINE_END: u8 = b'\r';

/// Reply to a rejected command (BEL)
pub const NACK: u8 = 0x07;

/// Longest accepted command line, terminator excluded
pub const MAX_LINE_LEN: usize = 40;

/// Longest encoded frame: `T` + 8 id + 1 len + 16 data + `\r`
pub const MAX_FRAME_LEN: usize = 1 + 8 + 1 + 2 * MAX_DATA_LEN + 1;

/// Bit rates selected by `S0` through `S8`
pub const BITRATES: [u32; 9] = [
    10_000, 20_000, 50_000, 100_000, 125_000, 250_000, 500_000, 800_000, 1_000_000,
];

const STANDARD_ID_DIGITS: usize = 3;
const EXTENDED_ID_DIGITS: usize = 8;
const HEX: &[u8; 16] = b"0123456789abcdef";

/// SLCAN decode/encode errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlcanError {
    /// Line exceeded [`MAX_LINE_LEN`] and was discarded
    LineTooLong,
    /// First character is not a known command
    UnknownCommand,
    /// Non-hex character in id, length or data
    InvalidHex,
    /// Data length above 8 or not matching the digits supplied
    InvalidLength,
    /// Identifier out of range for the frame type
    InvalidId,
    /// `S` argument missing or not 0-8
    InvalidBitrate,
    /// Output buffer too small for the encoded frame
    BufferTooSmall,
}

/// Decoded host command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Open,
    Close,
    /// Bit rate in bits/s
    SetBitrate(u32),
    Transmit(CanMessage),
}

/// Decode one line, terminator excluded
pub fn parse_command(line: &[u8]) -> Result<Command, SlcanError> {
    match line {
        [b'O'] => Ok(Command::Open),
        [b'C'] => Ok(Command::Close),
        [b'S', code] => match code {
            b'0'..=b'8' => Ok(Command::SetBitrate(BITRATES[(code - b'0') as usize])),
            _ => Err(SlcanError::InvalidBitrate),
        },
        [b'S', ..] => Err(SlcanError::InvalidBitrate),
        [b't', rest @ ..] => parse_frame(rest, STANDARD_ID_DIGITS, false).map(Command::Transmit),
        [b'T', rest @ ..] => parse_frame(rest, EXTENDED_ID_DIGITS, false).map(Command::Transmit),
        [b'r', rest @ ..] => parse_frame(rest, STANDARD_ID_DIGITS, true).map(Command::Transmit),
        [b'R', rest @ ..] => parse_frame(rest, EXTENDED_ID_DIGITS, true).map(Command::Transmit),
        _ => Err(SlcanError::UnknownCommand),
    }
}

fn parse_frame(body: &[u8], id_digits: usize, rtr: bool) -> Result<CanMessage, SlcanError> {
    if body.len() < id_digits + 1 {
        return Err(SlcanError::InvalidLength);
    }
    let (id, rest) = body.split_at(id_digits);
    let id = parse_hex(id)?;
    let len = hex_digit(rest[0])? as usize;
    let data_digits = &rest[1..];

    // Remote frames carry a length but no data digits
    let expected_digits = if rtr { 0 } else { 2 * len };
    if len > MAX_DATA_LEN || data_digits.len() != expected_digits {
        return Err(SlcanError::InvalidLength);
    }

    let mut data = [0u8; MAX_DATA_LEN];
    for (byte, pair) in data.iter_mut().zip(data_digits.chunks_exact(2)) {
        *byte = parse_hex(pair)? as u8;
    }

    let payload = if rtr { &[][..] } else { &data[..len] };
    let message = if id_digits == EXTENDED_ID_DIGITS {
        CanMessage::new_extended(id, payload)
    } else {
        CanMessage::new(id, payload)
    };
    let mut message = message.map_err(|_: CanError| SlcanError::InvalidId)?;
    if rtr {
        message.rtr = true;
        message.len = len as u8;
    }
    Ok(message)
}

fn hex_digit(c: u8) -> Result<u8, SlcanError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(SlcanError::InvalidHex),
    }
}

fn parse_hex(digits: &[u8]) -> Result<u32, SlcanError> {
    digits
        .iter()
        .try_fold(0u32, |acc, &c| Ok((acc << 4) | hex_digit(c)? as u32))
}

/// Encode a received frame into `buffer`
///
/// Returns the number of bytes written, terminator included.
pub fn encode_frame(message: &CanMessage, buffer: &mut [u8]) -> Result<usize, SlcanError> {
    let len = message.len.min(MAX_DATA_LEN as u8);
    let data = if message.rtr { &[][..] } else { message.data() };
    let (tag, id_digits) = match (message.extended, message.rtr) {
        (false, false) => (b't', STANDARD_ID_DIGITS),
        (true, false) => (b'T', EXTENDED_ID_DIGITS),
        (false, true) => (b'r', STANDARD_ID_DIGITS),
        (true, true) => (b'R', EXTENDED_ID_DIGITS),
    };

    let frame_len = 1 + id_digits + 1 + 2 * data.len() + 1;
    if buffer.len() < frame_len {
        return Err(SlcanError::BufferTooSmall);
    }

    buffer[0] = tag;
    for i in 0..id_digits {
        let shift = 4 * (id_digits - 1 - i);
        buffer[1 + i] = HEX[((message.id >> shift) & 0xF) as usize];
    }

    let mut pos = 1 + id_digits;
    buffer[pos] = b'0' + len;
    pos += 1;

    for &byte in data {
        buffer[pos] = HEX[(byte >> 4) as usize];
        buffer[pos + 1] = HEX[(byte & 0xF) as usize];
        pos += 2;
    }
    buffer[pos] = LINE_END;

    Ok(frame_len)
}

/// Encode a received frame into a heapless Vec
pub fn encode_frame_to_vec(message: &CanMessage) -> Result<Vec<u8, MAX_FRAME_LEN>, SlcanError> {
    let mut buffer = [0u8; MAX_FRAME_LEN];
    let len = encode_frame(message, &mut buffer)?;
    let mut vec = Vec::new();
    vec.extend_from_slice(&buffer[..len])
        .map_err(|_| SlcanError::BufferTooSmall)?;
    Ok(vec)
}

/// Accumulates host bytes into command lines
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    line: Vec<u8, MAX_LINE_LEN>,
    overflow: bool,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte from the host
    ///
    /// Returns `Ok(Some(command))` when a line completes, `Ok(None)` while
    /// a line is in progress or for a blank line. An overlong line is
    /// dropped whole and reported once its terminator arrives.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Command>, SlcanError> {
        match byte {
            LINE_END => {
                let result = if self.overflow {
                    Err(SlcanError::LineTooLong)
                } else if self.line.is_empty() {
                    Ok(None)
                } else {
                    parse_command(&self.line).map(Some)
                };
                self.reset();
                result
            }
            // Tolerate CR LF from terminals
            b'\n' => Ok(None),
            _ => {
                if self.line.push(byte).is_err() {
                    self.overflow = true;
                }
                Ok(None)
            }
        }
    }

    /// Discard any partial line
    pub fn reset(&mut self) {
        self.line.clear();
        self.overflow = false;
    }
}
