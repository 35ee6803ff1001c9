//! CAN gateway
//!
//! Wraps the CAN channel collaborator with the transceiver power rail and
//! a staged bit rate. The bit rate is only applied when the channel is
//! started; changing it while the channel runs is accepted silently and
//! takes effect after the next disable/enable cycle.

use carloop_hal::{CanChannel, CanError, CanMessage, OutputPin};

use crate::power::PowerRail;

/// CAN channel plus transceiver power
pub struct CanGateway<C, P> {
    channel: C,
    rail: PowerRail<P>,
    /// Bit rate for the next `enable`
    speed: u32,
    /// Bit rate the running channel was started with
    live_bitrate: Option<u32>,
}

impl<C: CanChannel, P: OutputPin> CanGateway<C, P> {
    /// Create a disabled gateway staged at `default_speed`
    pub fn new(channel: C, rail: PowerRail<P>, default_speed: u32) -> Self {
        Self {
            channel,
            rail,
            speed: default_speed,
            live_bitrate: None,
        }
    }

    /// Stage the bit rate for the next `enable`
    pub fn set_speed(&mut self, bitrate: u32) {
        self.speed = bitrate;
    }

    /// Bit rate of the running channel, `None` when disabled
    pub fn live_bitrate(&self) -> Option<u32> {
        self.live_bitrate
    }

    /// Power the transceiver and start the channel at the staged rate
    ///
    /// Does nothing if the channel is already running.
    pub fn enable(&mut self) {
        if self.is_enabled() {
            return;
        }

        self.rail.enable();
        self.channel.begin(self.speed);
        self.live_bitrate = Some(self.speed);
    }

    /// Stop the channel and cut transceiver power
    pub fn disable(&mut self) {
        if !self.is_enabled() {
            return;
        }

        self.channel.end();
        self.rail.disable();
        self.live_bitrate = None;
    }

    /// Check if the channel is running
    pub fn is_enabled(&self) -> bool {
        self.live_bitrate.is_some()
    }

    /// Queue a message on the bus
    pub fn transmit(&mut self, message: &CanMessage) -> Result<(), CanError> {
        if !self.is_enabled() {
            return Err(CanError::Disabled);
        }
        self.channel.transmit(message)
    }

    /// Pop the next received message without blocking
    ///
    /// Always `None` while the gateway is disabled.
    pub fn receive(&mut self) -> Option<CanMessage> {
        if !self.is_enabled() {
            return None;
        }
        self.channel.receive()
    }

    /// Get access to the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Get access to the transceiver rail
    pub fn rail(&self) -> &PowerRail<P> {
        &self.rail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCan, MockPin};
    use carloop_hal::Level;

    fn gateway() -> CanGateway<MockCan, MockPin> {
        let rail = PowerRail::new(MockPin::new(), Level::Low);
        CanGateway::new(MockCan::new(), rail, 500_000)
    }

    #[test]
    fn test_enable_uses_staged_speed() {
        let mut can = gateway();
        can.set_speed(250_000);
        can.enable();

        assert!(can.is_enabled());
        assert_eq!(can.channel().begun_with, Some(250_000));
        assert_eq!(can.live_bitrate(), Some(250_000));
        // Active-low transceiver enable
        assert!(!can.rail().pin().is_set_high());
    }

    #[test]
    fn test_speed_change_waits_for_restart() {
        let mut can = gateway();
        can.set_speed(250_000);
        can.enable();

        can.set_speed(125_000);
        can.enable();
        assert_eq!(can.live_bitrate(), Some(250_000));
        assert_eq!(can.channel().begin_calls, 1);

        can.disable();
        can.enable();
        assert_eq!(can.live_bitrate(), Some(125_000));
        assert_eq!(can.channel().begun_with, Some(125_000));
    }

    #[test]
    fn test_disable_stops_channel_then_power() {
        let mut can = gateway();
        can.enable();
        can.disable();

        assert!(!can.is_enabled());
        assert!(!can.channel().running);
        assert!(can.rail().pin().is_set_high());
        assert_eq!(can.live_bitrate(), None);
    }

    #[test]
    fn test_receive_when_disabled() {
        let mut can = gateway();
        can.channel.rx.push_back(CanMessage::new(0x7E8, &[1]).unwrap());

        assert_eq!(can.receive(), None);
        // Queue untouched
        assert_eq!(can.channel().rx.len(), 1);
    }

    #[test]
    fn test_transmit_and_drain() {
        let mut can = gateway();
        let msg = CanMessage::new(0x7E0, &[0x02, 0x01, 0x0C]).unwrap();
        assert_eq!(can.transmit(&msg), Err(CanError::Disabled));

        can.enable();
        assert_eq!(can.transmit(&msg), Ok(()));
        assert_eq!(can.channel().tx, [msg]);

        can.channel.rx.push_back(CanMessage::new(0x7E8, &[1]).unwrap());
        can.channel.rx.push_back(CanMessage::new(0x7E9, &[2]).unwrap());

        let mut count = 0;
        while can.receive().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
