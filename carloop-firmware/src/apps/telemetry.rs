//! Telemetry logger
//!
//! Polls engine speed over OBD-II and logs a status line once a second:
//! battery voltage, CAN traffic and the latest GPS fix.

use carloop_core::Carloop;
use carloop_protocol::{Pid, Poller};
use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use crate::board::Photon;

/// Foreground loop period
const LOOP_PERIOD: Duration = Duration::from_millis(10);

/// Status report period
const REPORT_PERIOD: Duration = Duration::from_secs(1);

pub async fn run(mut carloop: Carloop<Photon>) -> ! {
    info!("Telemetry app started");

    let mut poller = Poller::new(Pid::EngineRpm);
    let mut ticker = Ticker::every(LOOP_PERIOD);
    let mut last_report = Instant::now();
    let mut can_messages: u32 = 0;
    let mut rpm: Option<f32> = None;

    loop {
        carloop.update();

        while let Some(message) = carloop.can().receive() {
            can_messages = can_messages.wrapping_add(1);
            if let Some(value) = poller.on_message(&message) {
                rpm = Some(value);
            }
        }

        if carloop.can().is_enabled() {
            if let Some(request) = poller.poll(Instant::now().as_millis()) {
                if let Err(e) = carloop.can().transmit(&request) {
                    debug!("OBD request dropped: {}", e);
                }
            }
        }

        if last_report.elapsed() >= REPORT_PERIOD {
            last_report = Instant::now();
            report(&carloop, can_messages, rpm);
        }

        ticker.next().await;
    }
}

fn report(carloop: &Carloop<Photon>, can_messages: u32, rpm: Option<f32>) {
    info!(
        "battery={}V can_rx={} rpm={}",
        carloop.battery(),
        can_messages,
        rpm
    );

    if !carloop.has_gps() {
        return;
    }

    let gps = carloop.gps().snapshot();
    if gps.location.is_valid() {
        info!(
            "gps fix lat={} lng={}",
            gps.location.lat(),
            gps.location.lng()
        );
    } else {
        info!("gps no fix");
    }
    if gps.date.is_valid() && gps.time.is_valid() {
        info!(
            "gps {}-{}-{} {}:{}:{}",
            gps.date.year(),
            gps.date.month(),
            gps.date.day(),
            gps.time.hour(),
            gps.time.minute(),
            gps.time.second()
        );
    }
    info!(
        "gps chars={} failed_checksum={}",
        gps.chars_processed, gps.failed_checksum
    );
}
