//! CAN bus abstractions
//!
//! The transceiver driver itself (bit timing, arbitration, bus-off
//! recovery) lives in the chip HAL. This module only describes the message
//! type and the channel operations the Carloop core sequences.

/// Maximum data bytes in a classic CAN frame
pub const MAX_DATA_LEN: usize = 8;

/// Highest 11-bit standard identifier
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Highest 29-bit extended identifier
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Errors reported by CAN operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanError {
    /// Channel is not enabled
    Disabled,
    /// No free transmit mailbox
    Busy,
    /// Identifier or length out of range
    InvalidFrame,
}

/// Classic CAN message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanMessage {
    /// Message identifier (11 or 29 bits)
    pub id: u32,
    /// Identifier is 29-bit extended
    pub extended: bool,
    /// Remote transmission request
    pub rtr: bool,
    /// Number of valid data bytes (0-8)
    pub len: u8,
    /// Payload; bytes past `len` are zero
    pub data: [u8; MAX_DATA_LEN],
}

impl CanMessage {
    /// Create a standard-id data frame
    pub fn new(id: u32, data: &[u8]) -> Result<Self, CanError> {
        if id > MAX_STANDARD_ID {
            return Err(CanError::InvalidFrame);
        }
        Self::build(id, false, data)
    }

    /// Create an extended-id data frame
    pub fn new_extended(id: u32, data: &[u8]) -> Result<Self, CanError> {
        if id > MAX_EXTENDED_ID {
            return Err(CanError::InvalidFrame);
        }
        Self::build(id, true, data)
    }

    fn build(id: u32, extended: bool, data: &[u8]) -> Result<Self, CanError> {
        if data.len() > MAX_DATA_LEN {
            return Err(CanError::InvalidFrame);
        }

        let mut buf = [0u8; MAX_DATA_LEN];
        buf[..data.len()].copy_from_slice(data);

        Ok(Self {
            id,
            extended,
            rtr: false,
            len: data.len() as u8,
            data: buf,
        })
    }

    /// The valid payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data[..(self.len as usize).min(MAX_DATA_LEN)]
    }
}

/// CAN channel collaborator
///
/// `receive` must never block: it returns `None` when no message is
/// queued, and callers drain it in a loop once per tick.
pub trait CanChannel {
    /// Start the controller at `bitrate` bits per second
    fn begin(&mut self, bitrate: u32);

    /// Stop the controller
    fn end(&mut self);

    /// Queue a message for transmission
    fn transmit(&mut self, message: &CanMessage) -> Result<(), CanError>;

    /// Pop the next received message, if any
    fn receive(&mut self) -> Option<CanMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_message() {
        let msg = CanMessage::new(0x7E0, &[0x02, 0x01, 0x0C]).unwrap();
        assert_eq!(msg.len, 3);
        assert!(!msg.extended);
        assert_eq!(msg.data(), &[0x02, 0x01, 0x0C]);
        assert_eq!(msg.data[3..], [0; 5]);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(CanMessage::new(0x800, &[]), Err(CanError::InvalidFrame));
        assert_eq!(
            CanMessage::new(0x100, &[0; 9]),
            Err(CanError::InvalidFrame)
        );
        assert!(CanMessage::new_extended(0x18DA_F110, &[1]).is_ok());
        assert_eq!(
            CanMessage::new_extended(0x2000_0000, &[]),
            Err(CanError::InvalidFrame)
        );
    }
}
