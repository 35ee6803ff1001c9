//! Photon/P1 board wiring
//!
//! Module pin to MCU pin map used by the Carloop:
//!
//! | Module | MCU  | Function                     |
//! |--------|------|------------------------------|
//! | D0     | PB7  | CAN transceiver enable (low) |
//! | D1     | PB6  | CAN2 TX                      |
//! | D2     | PB5  | CAN2 RX                      |
//! | A0     | PC5  | GPS power enable (high)      |
//! | A1     | PC3  | Battery sense (ADC123_IN13)  |
//! | TX     | PA2  | USART2 TX to GPS             |
//! | RX     | PA3  | USART2 RX from GPS           |

use carloop_core::carloop::BoardGps;
use carloop_core::BoardIo;
use carloop_drivers::gps::NmeaParser;
use carloop_hal::gpio::EhOutputPin;
use carloop_hal_stm32f2::adc::AdcInput;
use carloop_hal_stm32f2::can::BxCanChannel;
use carloop_hal_stm32f2::serial::GpsSerial;
use embassy_stm32::adc::AnyAdcChannel;
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{ADC1, CAN1, CAN2, USART2};
use embassy_stm32::{bind_interrupts, can, usart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::tasks::gps::EmbassyIngestSpawner;

#[cfg(feature = "revision-2")]
pub use carloop_core::CARLOOP_REVISION_2 as BOARD_CONFIG;

/// First filter bank owned by CAN2
pub const CAN2_FIRST_BANK: u8 = 14;

bind_interrupts!(pub struct Irqs {
    CAN1_RX0 => can::Rx0InterruptHandler<CAN1>;
    CAN1_RX1 => can::Rx1InterruptHandler<CAN1>;
    CAN1_SCE => can::SceInterruptHandler<CAN1>;
    CAN1_TX => can::TxInterruptHandler<CAN1>;
    CAN2_RX0 => can::Rx0InterruptHandler<CAN2>;
    CAN2_RX1 => can::Rx1InterruptHandler<CAN2>;
    CAN2_SCE => can::SceInterruptHandler<CAN2>;
    CAN2_TX => can::TxInterruptHandler<CAN2>;
    USART2 => usart::BufferedInterruptHandler<USART2>;
});

/// Peripheral types of the Photon build
pub struct Photon;

impl BoardIo for Photon {
    type Can = BxCanChannel<'static>;
    type CanEnable = EhOutputPin<Output<'static>>;
    type GpsEnable = EhOutputPin<Output<'static>>;
    type Battery = AdcInput<'static, ADC1, AnyAdcChannel<ADC1>>;
    type Mutex = CriticalSectionRawMutex;
    type Serial = GpsSerial;
    type Gps = NmeaParser;
    type Spawner = EmbassyIngestSpawner;
}

/// Shared GPS state of the Photon build
pub type PhotonGps = BoardGps<Photon>;
