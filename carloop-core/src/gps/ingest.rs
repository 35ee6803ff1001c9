//! GPS ingest task
//!
//! State machine:
//!
//! ```text
//! Uncreated ──(first successful enable)──► Running
//! ```
//!
//! `Running` is terminal. Disabling the GPS only cuts receiver power; the
//! background task keeps polling an empty UART and picks the stream up
//! again after the next enable. There is no shutdown path.

use carloop_hal::{OutputPin, SerialPort};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use super::parser::GpsParser;
use super::shared::SharedGps;
use crate::power::PowerRail;

/// Pause between serial drains (microseconds)
pub const INGEST_INTERVAL_US: u32 = 1_000;

/// The executor could not start the ingest task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpawnError {
    /// Task pool exhausted
    Busy,
}

/// Lifecycle of the background task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IngestState {
    /// No task started yet
    Uncreated,
    /// Task started; runs for the life of the process
    Running,
}

/// Starts the background task on the platform's executor
///
/// The firmware implements this with an embassy `Spawner` and a task that
/// awaits [`run`]; host tests use a std thread.
pub trait IngestSpawner<M, S, P> {
    /// Start a task running [`run`] on `gps`
    fn spawn(&mut self, gps: &'static SharedGps<M, S, P>) -> Result<(), SpawnError>;
}

/// Background ingest loop
///
/// Drains every available byte into the parser under the lock, releases
/// it, then yields for [`INGEST_INTERVAL_US`]. Never returns and has no
/// error path; bad input only moves the parser's checksum counter.
pub async fn run<M, S, P, D>(gps: &SharedGps<M, S, P>, mut delay: D) -> !
where
    M: RawMutex,
    S: SerialPort,
    P: GpsParser,
    D: DelayNs,
{
    loop {
        gps.ingest();
        delay.delay_us(INGEST_INTERVAL_US).await;
    }
}

/// GPS power, serial start-up and the lazily spawned ingest task
pub struct GpsIngestTask<M: 'static, S: 'static, P: 'static, G, K> {
    shared: &'static SharedGps<M, S, P>,
    rail: PowerRail<G>,
    baud_rate: u32,
    spawner: K,
    state: IngestState,
}

impl<M, S, P, G, K> GpsIngestTask<M, S, P, G, K>
where
    M: RawMutex + 'static,
    S: SerialPort + 'static,
    P: GpsParser + 'static,
    G: OutputPin,
    K: IngestSpawner<M, S, P>,
{
    /// Create an unpowered subsystem with no task
    pub fn new(
        shared: &'static SharedGps<M, S, P>,
        rail: PowerRail<G>,
        baud_rate: u32,
        spawner: K,
    ) -> Self {
        Self {
            shared,
            rail,
            baud_rate,
            spawner,
            state: IngestState::Uncreated,
        }
    }

    /// Power the receiver, start the UART and ensure the task runs
    ///
    /// The task is spawned at most once. If spawning fails the state stays
    /// `Uncreated` and the next call retries.
    pub fn enable(&mut self) -> Result<(), SpawnError> {
        self.rail.enable();
        self.shared.begin_serial(self.baud_rate);

        if self.state == IngestState::Uncreated {
            self.spawner.spawn(self.shared)?;
            self.state = IngestState::Running;
        }
        Ok(())
    }

    /// Cut receiver power; the task keeps running
    pub fn disable(&mut self) {
        self.rail.disable();
    }

    /// Check if the receiver is powered
    pub fn is_enabled(&self) -> bool {
        self.rail.is_enabled()
    }

    /// Task lifecycle state
    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Shared parser state
    pub fn shared(&self) -> &'static SharedGps<M, S, P> {
        self.shared
    }

    /// Get access to the receiver rail
    pub fn rail(&self) -> &PowerRail<G> {
        &self.rail
    }

    /// Get access to the spawner
    pub fn spawner(&self) -> &K {
        &self.spawner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{
        leak_gps, CountingSpawner, MockParser, MockPin, MockSerial, TestGps, ThreadSpawner,
    };
    use carloop_hal::Level;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::time::{Duration, Instant};

    type Task<K> = GpsIngestTask<CriticalSectionRawMutex, MockSerial, MockParser, MockPin, K>;

    fn task<K: IngestSpawner<CriticalSectionRawMutex, MockSerial, MockParser>>(
        gps: &'static TestGps,
        spawner: K,
    ) -> Task<K> {
        GpsIngestTask::new(gps, PowerRail::new(MockPin::new(), Level::High), 9600, spawner)
    }

    #[test]
    fn test_double_enable_spawns_once() {
        let gps = leak_gps(MockSerial::new());
        let mut gps_task = task(gps, CountingSpawner::new());
        assert_eq!(gps_task.state(), IngestState::Uncreated);

        gps_task.enable().unwrap();
        gps_task.enable().unwrap();

        assert_eq!(gps_task.state(), IngestState::Running);
        assert_eq!(gps_task.spawner().spawns(), 1);
    }

    #[test]
    fn test_disable_keeps_task() {
        let serial = MockSerial::new();
        let gps = leak_gps(serial.clone());
        let mut gps_task = task(gps, CountingSpawner::new());

        gps_task.enable().unwrap();
        assert!(gps_task.rail().pin().is_set_high());
        assert_eq!(serial.baud(), Some(9600));

        gps_task.disable();
        assert!(!gps_task.is_enabled());
        assert!(!gps_task.rail().pin().is_set_high());
        assert_eq!(gps_task.state(), IngestState::Running);

        gps_task.enable().unwrap();
        assert_eq!(gps_task.spawner().spawns(), 1);
        assert_eq!(serial.begin_calls(), 2);
    }

    #[test]
    fn test_spawn_failure_retries() {
        let gps = leak_gps(MockSerial::new());
        let mut gps_task = task(gps, CountingSpawner::failing(1));

        assert_eq!(gps_task.enable(), Err(SpawnError::Busy));
        assert_eq!(gps_task.state(), IngestState::Uncreated);
        // Power and UART are still brought up
        assert!(gps_task.is_enabled());

        assert_eq!(gps_task.enable(), Ok(()));
        assert_eq!(gps_task.state(), IngestState::Running);
        assert_eq!(gps_task.spawner().spawns(), 1);
    }

    #[test]
    fn test_background_task_ingests() {
        let serial = MockSerial::new();
        let gps = leak_gps(serial.clone());
        let mut gps_task = task(gps, ThreadSpawner);
        gps_task.enable().unwrap();

        serial.push(b"42\n");

        let deadline = Instant::now() + Duration::from_secs(5);
        while gps.snapshot().passed_checksum == 0 {
            assert!(Instant::now() < deadline, "ingest task made no progress");
            std::thread::sleep(Duration::from_millis(1));
        }

        let snap = gps.snapshot();
        assert_eq!(snap.location.lat(), 42.0);
        assert_eq!(snap.date.day(), 42);
        assert_eq!(snap.chars_processed, 3);
    }

    #[test]
    fn test_locked_reads_never_tear() {
        let serial = MockSerial::new();
        let gps = leak_gps(serial.clone());
        let mut gps_task = task(gps, ThreadSpawner);
        gps_task.enable().unwrap();

        let feeder = std::thread::spawn(move || {
            for n in 1..=200u32 {
                let mut line = std::format!("{}\n", n).into_bytes();
                // Split sentences across drains
                let tail = line.split_off(line.len() / 2);
                serial.push(&line);
                std::thread::yield_now();
                serial.push(&tail);
            }
        });

        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let (lat, day, committed) =
                gps.lock(|p| (p.location().lat(), p.date().day(), p.passed_checksum()));
            assert_eq!(lat as u32 % 256, day as u32, "torn read at {committed}");

            if committed == 200 {
                break;
            }
            assert!(Instant::now() < deadline, "ingest stalled at {committed}");
            std::thread::yield_now();
        }

        feeder.join().unwrap();
        assert_eq!(gps.snapshot().failed_checksum, 0);
    }
}
