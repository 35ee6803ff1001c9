//! OBD-II service 01 (current data) over 11-bit CAN
//!
//! Requests go to the functional engine ECU address and replies come back
//! from the first ECU:
//!
//! ```text
//! request  0x7E0: [02, 01, pid, 00, 00, 00, 00, 00]
//! reply    0x7E8: [len, 41, pid, A, B, ...]
//! ```

use carloop_hal::can::MAX_DATA_LEN;
use carloop_hal::CanMessage;

/// Engine ECU request identifier
pub const REQUEST_ID: u32 = 0x7E0;

/// Engine ECU reply identifier
pub const REPLY_ID: u32 = 0x7E8;

/// Show current data
pub const SERVICE_CURRENT_DATA: u8 = 0x01;

/// Supported parameter identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Pid {
    /// Engine coolant temperature (°C)
    CoolantTemp = 0x05,
    /// Engine speed (rpm)
    EngineRpm = 0x0C,
    /// Vehicle speed (km/h)
    VehicleSpeed = 0x0D,
    /// Mass air flow (g/s)
    MafRate = 0x10,
    /// Throttle position (%)
    Throttle = 0x11,
    /// Oxygen sensor 1 voltage (V)
    O2Voltage = 0x14,
}

impl Pid {
    /// Raw PID byte
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Number of data bytes (A, B, ..) the reply carries
    pub const fn data_len(self) -> u8 {
        match self {
            Pid::EngineRpm | Pid::MafRate => 2,
            Pid::CoolantTemp | Pid::VehicleSpeed | Pid::Throttle | Pid::O2Voltage => 1,
        }
    }

    /// Decode the A/B data bytes of a reply into engineering units
    pub fn decode(self, a: u8, b: u8) -> f32 {
        let (a, b) = (a as f32, b as f32);
        match self {
            Pid::CoolantTemp => a - 40.0,
            Pid::EngineRpm => (256.0 * a + b) / 4.0,
            Pid::VehicleSpeed => a,
            Pid::MafRate => (256.0 * a + b) / 100.0,
            Pid::Throttle => a * 100.0 / 255.0,
            Pid::O2Voltage => a / 200.0,
        }
    }
}

/// Build the 8-byte request for `pid`
pub fn request(pid: Pid) -> CanMessage {
    let mut data = [0u8; MAX_DATA_LEN];
    data[0] = 0x02;
    data[1] = SERVICE_CURRENT_DATA;
    data[2] = pid.code();

    CanMessage {
        id: REQUEST_ID,
        extended: false,
        rtr: false,
        len: MAX_DATA_LEN as u8,
        data,
    }
}

/// Positive response service id for [`SERVICE_CURRENT_DATA`]
pub const RESPONSE_CURRENT_DATA: u8 = SERVICE_CURRENT_DATA + 0x40;

/// Check if `message` is a positive response to a request for `pid`
///
/// The frame is padded to eight bytes, so the payload length comes from
/// the single-frame length byte, not the DLC. It must cover the service
/// id, the PID and every data byte of `pid`.
pub fn is_reply(message: &CanMessage, pid: Pid) -> bool {
    let payload_len = message.data[0] as usize;
    message.id == REPLY_ID
        && !message.extended
        && !message.rtr
        && payload_len >= 2 + pid.data_len() as usize
        && payload_len < MAX_DATA_LEN
        && message.len as usize > payload_len
        && message.data[1] == RESPONSE_CURRENT_DATA
        && message.data[2] == pid.code()
}

/// Decoded value if `message` answers a request for `pid`
pub fn reply_value(message: &CanMessage, pid: Pid) -> Option<f32> {
    if !is_reply(message, pid) {
        return None;
    }
    let b = if pid.data_len() > 1 { message.data[4] } else { 0 };
    Some(pid.decode(message.data[3], b))
}

/// How long to listen for a reply after a request (ms)
pub const REPLY_WINDOW_MS: u64 = 100;

/// Time from one request to the next (ms)
pub const REQUEST_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollPhase {
    /// Next `poll` sends a request
    Ready,
    /// Request sent, accepting replies
    AwaitingReply,
    /// Reply window closed, waiting out the interval
    Idle,
}

/// Periodic single-PID request loop
///
/// Time is passed in by the caller, so the poller works with any clock.
///
/// ```text
/// Ready ──request──► AwaitingReply ──100 ms──► Idle ──400 ms──► Ready
/// ```
#[derive(Debug, Clone)]
pub struct Poller {
    pid: Pid,
    phase: PollPhase,
    since_ms: u64,
}

impl Poller {
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            phase: PollPhase::Ready,
            since_ms: 0,
        }
    }

    /// Advance the schedule; returns a request when one is due
    pub fn poll(&mut self, now_ms: u64) -> Option<CanMessage> {
        let elapsed = now_ms.saturating_sub(self.since_ms);
        match self.phase {
            PollPhase::Ready => {
                self.enter(PollPhase::AwaitingReply, now_ms);
                Some(request(self.pid))
            }
            PollPhase::AwaitingReply if elapsed >= REPLY_WINDOW_MS => {
                self.enter(PollPhase::Idle, now_ms);
                None
            }
            PollPhase::Idle if elapsed >= REQUEST_INTERVAL_MS - REPLY_WINDOW_MS => {
                self.enter(PollPhase::AwaitingReply, now_ms);
                Some(request(self.pid))
            }
            _ => None,
        }
    }

    /// Offer a received message; returns the value if it is our reply
    ///
    /// Replies arriving outside the reply window are ignored.
    pub fn on_message(&self, message: &CanMessage) -> Option<f32> {
        if self.phase != PollPhase::AwaitingReply {
            return None;
        }
        reply_value(message, self.pid)
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    fn enter(&mut self, phase: PollPhase, now_ms: u64) {
        self.phase = phase;
        self.since_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_frame(data: &[u8]) -> CanMessage {
        CanMessage::new(REPLY_ID, data).unwrap()
    }

    #[test]
    fn test_request_layout() {
        let msg = request(Pid::EngineRpm);
        assert_eq!(msg.id, 0x7E0);
        assert_eq!(msg.len, 8);
        assert_eq!(msg.data, [0x02, 0x01, 0x0C, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_reply_matching() {
        let reply = CanMessage::new(REPLY_ID, &[0x04, 0x41, 0x0C, 0x1A, 0xF8]).unwrap();
        assert!(is_reply(&reply, Pid::EngineRpm));
        assert!(!is_reply(&reply, Pid::VehicleSpeed));

        let other_ecu = CanMessage::new(0x7E9, &[0x04, 0x41, 0x0C, 0x1A, 0xF8]).unwrap();
        assert!(!is_reply(&other_ecu, Pid::EngineRpm));

        let short = CanMessage::new(REPLY_ID, &[0x01, 0x41]).unwrap();
        assert!(!is_reply(&short, Pid::EngineRpm));
    }

    #[test]
    fn test_padded_reply_too_short_for_pid() {
        // Length byte says 3: SID, PID and only the A byte
        let reply = reply_frame(&[0x03, 0x41, 0x0C, 0x1A, 0, 0, 0, 0]);
        assert_eq!(reply_value(&reply, Pid::EngineRpm), None);

        let unpadded = reply_frame(&[0x03, 0x41, 0x0C, 0x1A]);
        assert_eq!(reply_value(&unpadded, Pid::EngineRpm), None);

        // One data byte is enough for vehicle speed
        let speed = reply_frame(&[0x03, 0x41, 0x0D, 0x58, 0xAA, 0xAA, 0xAA, 0xAA]);
        assert_eq!(reply_value(&speed, Pid::VehicleSpeed), Some(88.0));
    }

    #[test]
    fn test_negative_response_rejected() {
        let negative = reply_frame(&[0x04, 0x7F, 0x0C, 0x12, 0x00, 0, 0, 0]);
        assert!(!is_reply(&negative, Pid::EngineRpm));
        assert_eq!(reply_value(&negative, Pid::EngineRpm), None);

        // Length byte larger than the frame
        let truncated = reply_frame(&[0x06, 0x41, 0x0C, 0x1A, 0xF8]);
        assert_eq!(reply_value(&truncated, Pid::EngineRpm), None);
    }

    #[test]
    fn test_data_len() {
        assert_eq!(Pid::EngineRpm.data_len(), 2);
        assert_eq!(Pid::MafRate.data_len(), 2);
        assert_eq!(Pid::CoolantTemp.data_len(), 1);
        assert_eq!(Pid::O2Voltage.data_len(), 1);
    }

    #[test]
    fn test_decode() {
        let reply = CanMessage::new(REPLY_ID, &[0x04, 0x41, 0x0C, 0x1A, 0xF8]).unwrap();
        assert_eq!(reply_value(&reply, Pid::EngineRpm), Some(1726.0));

        assert_eq!(Pid::CoolantTemp.decode(0x7B, 0), 83.0);
        assert_eq!(Pid::VehicleSpeed.decode(88, 0), 88.0);
        assert_eq!(Pid::Throttle.decode(255, 0), 100.0);
        assert!((Pid::O2Voltage.decode(100, 0) - 0.5).abs() < 1e-6);
        assert!((Pid::MafRate.decode(0x01, 0x2C) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_poller_schedule() {
        let mut poller = Poller::new(Pid::EngineRpm);
        let reply = CanMessage::new(REPLY_ID, &[0x04, 0x41, 0x0C, 0x1A, 0xF8]).unwrap();

        assert_eq!(poller.on_message(&reply), None);
        assert_eq!(poller.poll(1_000), Some(request(Pid::EngineRpm)));
        assert_eq!(poller.phase(), PollPhase::AwaitingReply);
        assert_eq!(poller.on_message(&reply), Some(1726.0));

        assert_eq!(poller.poll(1_099), None);
        assert_eq!(poller.phase(), PollPhase::AwaitingReply);
        assert_eq!(poller.poll(1_100), None);
        assert_eq!(poller.phase(), PollPhase::Idle);
        // Late reply
        assert_eq!(poller.on_message(&reply), None);

        assert_eq!(poller.poll(1_499), None);
        assert_eq!(poller.poll(1_500), Some(request(Pid::EngineRpm)));
    }
}
