//! GPS ingest task
//!
//! Wraps the core ingest loop in an embassy task. The facade spawns it
//! through [`EmbassyIngestSpawner`] on the first GPS enable.

use carloop_core::gps::{ingest, IngestSpawner, SharedGps, SpawnError};
use carloop_drivers::gps::NmeaParser;
use carloop_hal_stm32f2::serial::GpsSerial;
use defmt::*;
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Delay;

use crate::board::PhotonGps;

/// GPS ingest task - drains the GPS UART into the NMEA parser forever
#[embassy_executor::task]
pub async fn gps_ingest_task(gps: &'static PhotonGps) {
    info!("GPS ingest task started");
    ingest::run(gps, Delay).await
}

/// Spawns [`gps_ingest_task`] on the thread-mode executor
pub struct EmbassyIngestSpawner(pub Spawner);

impl IngestSpawner<CriticalSectionRawMutex, GpsSerial, NmeaParser> for EmbassyIngestSpawner {
    fn spawn(
        &mut self,
        gps: &'static SharedGps<CriticalSectionRawMutex, GpsSerial, NmeaParser>,
    ) -> Result<(), SpawnError> {
        self.0.spawn(gps_ingest_task(gps)).map_err(|_| {
            warn!("GPS ingest task pool exhausted");
            SpawnError::Busy
        })
    }
}
