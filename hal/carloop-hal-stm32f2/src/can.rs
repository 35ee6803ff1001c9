//! bxCAN channel
//!
//! The Photon routes CAN2 to D1/D2. CAN2 shares its filter banks with
//! CAN1, so the firmware must split the banks and enable an accept-all
//! filter for CAN2 before handing the controller over.

use carloop_hal::{CanChannel, CanError, CanMessage};
use embassy_stm32::can::{Can, Frame};
use embedded_can::{ExtendedId, Frame as _, Id, StandardId};

/// embassy bxCAN controller driven through [`CanChannel`]
pub struct BxCanChannel<'d> {
    can: Can<'d>,
}

impl<'d> BxCanChannel<'d> {
    /// Wrap a controller with its filters already configured
    ///
    /// The controller is held in init mode until `begin`.
    pub fn new(mut can: Can<'d>) -> Self {
        can.modify_config().leave_disabled();
        Self { can }
    }
}

impl CanChannel for BxCanChannel<'_> {
    fn begin(&mut self, bitrate: u32) {
        // Leaving the config scope drops the controller out of init mode
        self.can.modify_config().set_bitrate(bitrate);
    }

    fn end(&mut self) {
        self.can.modify_config().leave_disabled();
    }

    fn transmit(&mut self, message: &CanMessage) -> Result<(), CanError> {
        let frame = to_frame(message)?;
        self.can
            .try_write(&frame)
            .map(|_| ())
            .map_err(|_| CanError::Busy)
    }

    fn receive(&mut self) -> Option<CanMessage> {
        let envelope = self.can.try_read().ok()?;
        from_frame(&envelope.frame)
    }
}

fn to_frame(message: &CanMessage) -> Result<Frame, CanError> {
    let id: Id = if message.extended {
        ExtendedId::new(message.id)
            .ok_or(CanError::InvalidFrame)?
            .into()
    } else {
        let raw = u16::try_from(message.id).map_err(|_| CanError::InvalidFrame)?;
        StandardId::new(raw).ok_or(CanError::InvalidFrame)?.into()
    };

    let frame = if message.rtr {
        <Frame as embedded_can::Frame>::new_remote(id, message.len as usize)
    } else {
        <Frame as embedded_can::Frame>::new(id, message.data())
    };
    frame.ok_or(CanError::InvalidFrame)
}

fn from_frame(frame: &Frame) -> Option<CanMessage> {
    let (id, extended) = match frame.id() {
        Id::Standard(id) => (id.as_raw() as u32, false),
        Id::Extended(id) => (id.as_raw(), true),
    };

    let mut message = if extended {
        CanMessage::new_extended(id, frame.data()).ok()?
    } else {
        CanMessage::new(id, frame.data()).ok()?
    };
    if frame.is_remote_frame() {
        message.rtr = true;
        message.len = frame.dlc() as u8;
    }
    Some(message)
}
