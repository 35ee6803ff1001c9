//! Test doubles for the hardware and collaborator traits

use std::boxed::Box;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::vec::Vec;

use carloop_hal::{AnalogInput, CanChannel, CanError, CanMessage, OutputPin, SerialPort};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal_async::delay::DelayNs;

use crate::gps::ingest::{self, IngestSpawner, SpawnError};
use crate::gps::{GpsDate, GpsParser, GpsTime, Location, SharedGps};

pub type TestGps = SharedGps<CriticalSectionRawMutex, MockSerial, MockParser>;

/// Give a shared GPS the `'static` lifetime the ingest task needs
pub fn leak_gps(serial: MockSerial) -> &'static TestGps {
    Box::leak(Box::new(TestGps::new(serial, MockParser::default())))
}

/// Output pin that remembers its level
pub struct MockPin {
    high: bool,
    pub writes: u32,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            high: false,
            writes: 0,
        }
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
        self.writes += 1;
    }

    fn set_low(&mut self) {
        self.high = false;
        self.writes += 1;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// ADC returning a settable value
pub struct MockAdc {
    pub value: u16,
    pub reads: u32,
}

impl MockAdc {
    pub fn new(value: u16) -> Self {
        Self { value, reads: 0 }
    }
}

impl AnalogInput for MockAdc {
    fn read(&mut self) -> u16 {
        self.reads += 1;
        self.value
    }
}

/// CAN channel with inspectable queues
pub struct MockCan {
    pub running: bool,
    pub begun_with: Option<u32>,
    pub begin_calls: u32,
    pub tx: Vec<CanMessage>,
    pub rx: VecDeque<CanMessage>,
}

impl MockCan {
    pub fn new() -> Self {
        Self {
            running: false,
            begun_with: None,
            begin_calls: 0,
            tx: Vec::new(),
            rx: VecDeque::new(),
        }
    }
}

impl CanChannel for MockCan {
    fn begin(&mut self, bitrate: u32) {
        self.running = true;
        self.begun_with = Some(bitrate);
        self.begin_calls += 1;
    }

    fn end(&mut self) {
        self.running = false;
    }

    fn transmit(&mut self, message: &CanMessage) -> Result<(), CanError> {
        self.tx.push(*message);
        Ok(())
    }

    fn receive(&mut self) -> Option<CanMessage> {
        self.rx.pop_front()
    }
}

#[derive(Default)]
struct SerialState {
    bytes: VecDeque<u8>,
    baud: Option<u32>,
    begin_calls: u32,
}

/// Serial source fed from the test thread
///
/// Clones share the same buffer, so a test keeps one handle while the
/// other sits inside the shared GPS state.
#[derive(Clone, Default)]
pub struct MockSerial {
    state: Arc<Mutex<SerialState>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, bytes: &[u8]) {
        self.state.lock().unwrap().bytes.extend(bytes.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().bytes.is_empty()
    }

    pub fn baud(&self) -> Option<u32> {
        self.state.lock().unwrap().baud
    }

    pub fn begin_calls(&self) -> u32 {
        self.state.lock().unwrap().begin_calls
    }
}

impl SerialPort for MockSerial {
    fn begin(&mut self, baud_rate: u32) {
        let mut state = self.state.lock().unwrap();
        state.baud = Some(baud_rate);
        state.begin_calls += 1;
    }

    fn available(&mut self) -> bool {
        !self.is_empty()
    }

    fn read(&mut self) -> Option<u8> {
        self.state.lock().unwrap().bytes.pop_front()
    }
}

/// Parser for a toy sentence format: decimal digits then `\n`
///
/// A sentence `n\n` commits location `(n, -n)` and then date day `n`, as
/// two separate writes, so an unsynchronized reader could catch them
/// apart. Any other byte counts as a checksum failure.
#[derive(Default)]
pub struct MockParser {
    pending: u32,
    location: Location,
    date: GpsDate,
    chars: u32,
    passed: u32,
    failed: u32,
}

impl GpsParser for MockParser {
    fn encode(&mut self, byte: u8) -> bool {
        self.chars += 1;
        match byte {
            b'0'..=b'9' => {
                self.pending = self.pending * 10 + (byte - b'0') as u32;
                false
            }
            b'\n' => {
                let n = self.pending;
                self.location = Location {
                    lat: n as f64,
                    lng: -(n as f64),
                    valid: true,
                };
                std::thread::yield_now();
                self.date = GpsDate {
                    year: 2016,
                    month: 1,
                    day: (n % 256) as u8,
                    valid: true,
                };
                self.pending = 0;
                self.passed += 1;
                true
            }
            _ => {
                self.pending = 0;
                self.failed += 1;
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
        GpsTime::default()
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

/// Records spawn requests without starting anything
pub struct CountingSpawner {
    spawns: u32,
    failures_left: u32,
}

impl CountingSpawner {
    pub fn new() -> Self {
        Self::failing(0)
    }

    /// Refuse the first `failures` spawn requests
    pub fn failing(failures: u32) -> Self {
        Self {
            spawns: 0,
            failures_left: failures,
        }
    }

    pub fn spawns(&self) -> u32 {
        self.spawns
    }
}

impl<M, S, P> IngestSpawner<M, S, P> for CountingSpawner {
    fn spawn(&mut self, _gps: &'static SharedGps<M, S, P>) -> Result<(), SpawnError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(SpawnError::Busy);
        }
        self.spawns += 1;
        Ok(())
    }
}

/// Delay backed by `std::thread::sleep`
pub struct StdDelay;

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
}

/// Runs the real ingest loop on a detached std thread
pub struct ThreadSpawner;

impl IngestSpawner<CriticalSectionRawMutex, MockSerial, MockParser> for ThreadSpawner {
    fn spawn(&mut self, gps: &'static TestGps) -> Result<(), SpawnError> {
        std::thread::spawn(move || {
            embassy_futures::block_on(ingest::run(gps, StdDelay));
        });
        Ok(())
    }
}
