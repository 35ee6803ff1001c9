//! USB CDC-ACM serial port for the SLCAN bridge

use defmt::*;
use embassy_stm32::peripherals::{PA11, PA12, USB_OTG_FS};
use embassy_stm32::usb::{self, Driver};
use embassy_stm32::{bind_interrupts, Peri};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(struct UsbIrqs {
    OTG_FS => usb::InterruptHandler<USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, USB_OTG_FS>;
pub type UsbSerial = CdcAcmClass<'static, UsbDriver>;

/// Largest CDC packet
pub const MAX_PACKET_SIZE: u16 = 64;

struct UsbBuffers {
    config_desc: [u8; 256],
    bos_desc: [u8; 256],
    control_buf: [u8; 64],
    ep_out: [u8; 256],
}

static BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

/// USB device task - services the bus for the lifetime of the firmware
#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) {
    info!("USB task started");
    device.run().await
}

/// Build the USB device and its CDC-ACM class
pub fn init(
    otg: Peri<'static, USB_OTG_FS>,
    dp: Peri<'static, PA12>,
    dm: Peri<'static, PA11>,
) -> (UsbDevice<'static, UsbDriver>, UsbSerial) {
    let buffers = BUFFERS.init(UsbBuffers {
        config_desc: [0; 256],
        bos_desc: [0; 256],
        control_buf: [0; 64],
        ep_out: [0; 256],
    });

    let mut driver_config = usb::Config::default();
    // The Photon powers the MCU from VBUS, no sense pin
    driver_config.vbus_detection = false;
    let driver = Driver::new_fs(otg, UsbIrqs, dp, dm, &mut buffers.ep_out, driver_config);

    let mut config = Config::new(0x2b04, 0xc006);
    config.manufacturer = Some("Carloop");
    config.product = Some("Carloop SLCAN");
    config.max_packet_size_0 = MAX_PACKET_SIZE as u8;

    let mut builder = Builder::new(
        driver,
        config,
        &mut buffers.config_desc,
        &mut buffers.bos_desc,
        &mut [],
        &mut buffers.control_buf,
    );
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), MAX_PACKET_SIZE);

    (builder.build(), class)
}
