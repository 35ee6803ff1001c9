//! Carloop - Vehicle Telemetry Firmware
//!
//! Firmware binary for the Carloop board on a Particle Photon/P1
//! (STM32F205). Brings up the CAN transceiver, the GPS receiver and the
//! battery sense input through the core facade, then hands control to the
//! foreground application.

#![no_std]
#![no_main]

use carloop_core::gps::SharedGps;
use carloop_core::{Carloop, CarloopParts, Features};
use carloop_drivers::gps::NmeaParser;
use carloop_hal::gpio::EhOutputPin;
use carloop_hal::Level;
use carloop_hal_stm32f2::adc::AdcInput;
use carloop_hal_stm32f2::can::BxCanChannel;
use carloop_hal_stm32f2::serial::gps_serial;
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::can::filter::Mask32;
use embassy_stm32::can::{Can, Fifo};
use embassy_stm32::gpio::{self, Output, Pin, Speed};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig};
use embassy_stm32::Peri;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::board::{Irqs, Photon, PhotonGps, BOARD_CONFIG, CAN2_FIRST_BANK};
use crate::tasks::EmbassyIngestSpawner;

mod apps;
mod board;
mod tasks;

// Static cells for UART buffers (must live forever)
static GPS_TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static GPS_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// GPS link shared between the ingest task and the application
static GPS: StaticCell<PhotonGps> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Carloop firmware starting ({})", BOARD_CONFIG.name);

    let p = embassy_stm32::init(clock_config());
    info!("Peripherals initialized");

    // GPS on USART2, receive only
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BOARD_CONFIG.gps_baud_rate;
    let tx_buf = GPS_TX_BUF.init([0u8; 16]);
    let rx_buf = GPS_RX_BUF.init([0u8; 256]);
    let uart =
        BufferedUart::new(p.USART2, p.PA3, p.PA2, tx_buf, rx_buf, Irqs, uart_config).unwrap();
    let (_gps_tx, gps_rx) = uart.split();
    let gps: &'static PhotonGps = GPS.init(SharedGps::new(
        gps_serial(gps_rx, BOARD_CONFIG.gps_baud_rate),
        NmeaParser::new(),
    ));
    info!("GPS UART initialized at {} baud", BOARD_CONFIG.gps_baud_rate);

    // Power switches start with their rails off
    let can_enable = output(p.PB7, BOARD_CONFIG.can_enable.inactive());
    let gps_enable = output(p.PC5, BOARD_CONFIG.gps_enable.inactive());

    // Battery divider on PC3
    let battery = AdcInput::new(Adc::new(p.ADC1), p.PC3.degrade_adc());

    // CAN2 filters live in CAN1, so CAN1 is clocked and kept for the
    // firmware's lifetime even though its pins are unused
    let mut can1 = Can::new(p.CAN1, p.PB8, p.PB9, Irqs);
    can1.modify_filters()
        .set_split(CAN2_FIRST_BANK)
        .slave_filters()
        .enable_bank(CAN2_FIRST_BANK, Fifo::Fifo0, Mask32::accept_all());
    let can = BxCanChannel::new(Can::new(p.CAN2, p.PB5, p.PB6, Irqs));
    info!("CAN2 initialized");

    let mut carloop: Carloop<Photon> = Carloop::new(
        BOARD_CONFIG,
        CarloopParts {
            can,
            can_enable,
            gps_enable,
            battery,
            gps,
            spawner: EmbassyIngestSpawner(spawner),
        },
    );

    #[cfg(not(feature = "slcan"))]
    {
        if let Err(e) = carloop.begin(Features::ALL) {
            warn!("GPS ingest not started: {}", e);
        }
        info!("Carloop ready, features {}", carloop.features());

        apps::telemetry::run(carloop).await;
    }

    #[cfg(feature = "slcan")]
    {
        // The host opens the CAN channel itself
        if let Err(e) = carloop.begin(Features::BATTERY) {
            warn!("Carloop begin failed: {}", e);
        }

        let (device, serial) = tasks::usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
        spawner.spawn(tasks::usb::usb_task(device)).unwrap();
        info!("USB initialized");

        apps::slcan::run(carloop, serial).await;
    }
}

/// 26 MHz HSE, 120 MHz system clock, 48 MHz for USB
fn clock_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(26_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll_src = PllSource::HSE;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV26,
        mul: PllMul::MUL240,
        divp: Some(PllPDiv::DIV2),
        divq: Some(PllQDiv::DIV5),
        divr: None,
    });
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV4;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.sys = Sysclk::PLL1_P;
    config
}

fn output(pin: Peri<'static, impl Pin>, level: Level) -> EhOutputPin<Output<'static>> {
    let initial = match level {
        Level::High => gpio::Level::High,
        Level::Low => gpio::Level::Low,
    };
    EhOutputPin::new(Output::new(pin, initial, Speed::Low), level)
}
