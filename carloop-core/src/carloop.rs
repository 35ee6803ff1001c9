//! Carloop facade
//!
//! Owns one instance of every subsystem and exposes the application-level
//! operations. The board wiring is injected twice: the pin and bus
//! assignments through a [`BoardConfig`] value, the concrete peripheral
//! types through a [`BoardIo`] type family.
//!
//! ```text
//!   begin(features)
//!       │
//!       ▼
//!   FeatureGate ──► CAN:     PowerRail + CanGateway
//!               ──► GPS:     PowerRail + SerialPort + GpsIngestTask
//!               ──► BATTERY: BatteryMonitor
//! ```

use carloop_hal::{AnalogInput, CanChannel, OutputPin, SerialPort};
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::battery::BatteryMonitor;
use crate::can::CanGateway;
use crate::config::BoardConfig;
use crate::features::{FeatureGate, Features};
use crate::gps::{GpsIngestTask, GpsParser, IngestSpawner, SharedGps, SpawnError};
use crate::power::PowerRail;

/// Concrete peripheral types of one board build
pub trait BoardIo {
    /// CAN controller
    type Can: CanChannel;
    /// CAN transceiver power switch
    type CanEnable: OutputPin;
    /// GPS receiver power switch
    type GpsEnable: OutputPin;
    /// Battery sense ADC channel
    type Battery: AnalogInput;
    /// Lock guarding the GPS link
    type Mutex: RawMutex + 'static;
    /// GPS UART
    type Serial: SerialPort + 'static;
    /// GPS sentence parser
    type Gps: GpsParser + 'static;
    /// Starts the GPS ingest task
    type Spawner: IngestSpawner<Self::Mutex, Self::Serial, Self::Gps>;
}

/// Shared GPS state type for a board
pub type BoardGps<B> =
    SharedGps<<B as BoardIo>::Mutex, <B as BoardIo>::Serial, <B as BoardIo>::Gps>;

/// Peripherals handed to [`Carloop::new`]
pub struct CarloopParts<B: BoardIo> {
    pub can: B::Can,
    pub can_enable: B::CanEnable,
    pub gps_enable: B::GpsEnable,
    pub battery: B::Battery,
    pub gps: &'static BoardGps<B>,
    pub spawner: B::Spawner,
}

/// Board facade
pub struct Carloop<B: BoardIo> {
    config: BoardConfig,
    gate: FeatureGate,
    can: CanGateway<B::Can, B::CanEnable>,
    gps: GpsIngestTask<B::Mutex, B::Serial, B::Gps, B::GpsEnable, B::Spawner>,
    battery: BatteryMonitor<B::Battery>,
}

impl<B: BoardIo> Carloop<B> {
    /// Create a facade with every subsystem unpowered
    pub fn new(config: BoardConfig, parts: CarloopParts<B>) -> Self {
        let can_rail = PowerRail::new(parts.can_enable, config.can_enable.active);
        let gps_rail = PowerRail::new(parts.gps_enable, config.gps_enable.active);

        Self {
            config,
            gate: FeatureGate::new(config.features),
            can: CanGateway::new(parts.can, can_rail, config.can_default_speed),
            gps: GpsIngestTask::new(parts.gps, gps_rail, config.gps_baud_rate, parts.spawner),
            battery: BatteryMonitor::new(parts.battery, config.battery_factor),
        }
    }

    /// Store the requested features and bring up every active subsystem
    ///
    /// Subsystems start in the order CAN, GPS, battery. A GPS spawn failure
    /// does not stop the battery from being enabled; the error is returned
    /// after all subsystems have been visited.
    pub fn begin(&mut self, features: Features) -> Result<(), SpawnError> {
        self.gate.request(features);

        if self.has_can() {
            self.enable_can();
        }

        let gps = if self.has_gps() {
            self.enable_gps()
        } else {
            Ok(())
        };

        if self.has_battery() {
            self.enable_battery();
        }

        gps
    }

    /// Per-tick foreground work
    pub fn update(&mut self) {
        if self.has_battery() {
            self.battery.update();
        }
    }

    /// Stage the CAN bit rate for the next `enable_can`
    pub fn set_can_speed(&mut self, bitrate: u32) {
        self.can.set_speed(bitrate);
    }

    pub fn enable_can(&mut self) {
        self.can.enable();
    }

    pub fn disable_can(&mut self) {
        self.can.disable();
    }

    /// Power the GPS, start its UART and the ingest task if needed
    pub fn enable_gps(&mut self) -> Result<(), SpawnError> {
        self.gps.enable()
    }

    /// Cut GPS power; the ingest task keeps running
    pub fn disable_gps(&mut self) {
        self.gps.disable();
    }

    pub fn enable_battery(&mut self) {
        self.battery.enable();
    }

    /// Take a fresh battery sample without touching the cache
    pub fn read_battery(&mut self) -> f32 {
        self.battery.read()
    }

    /// CAN gateway for transmit and receive
    pub fn can(&mut self) -> &mut CanGateway<B::Can, B::CanEnable> {
        &mut self.can
    }

    /// Shared GPS state; use `lock` for multi-field reads
    pub fn gps(&self) -> &'static BoardGps<B> {
        self.gps.shared()
    }

    /// Battery voltage cached by the last `update` (0.0 before the first)
    pub fn battery(&self) -> f32 {
        self.battery.voltage()
    }

    pub fn has_can(&self) -> bool {
        self.gate.has(Features::CAN)
    }

    pub fn has_gps(&self) -> bool {
        self.gate.has(Features::GPS)
    }

    pub fn has_battery(&self) -> bool {
        self.gate.has(Features::BATTERY)
    }

    /// Features both requested and supported
    pub fn features(&self) -> Features {
        self.gate.active()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// GPS task state and power rail
    pub fn gps_task(
        &self,
    ) -> &GpsIngestTask<B::Mutex, B::Serial, B::Gps, B::GpsEnable, B::Spawner> {
        &self.gps
    }
}
