//! GPS UART receiver
//!
//! The receive half of a `BufferedUart` is interrupt-driven, so the ingest
//! loop only ever drains its ring buffer.

use carloop_hal::serial::IoSerial;
use embassy_stm32::usart::BufferedUartRx;

/// Serial port over a buffered UART receiver
pub type GpsSerial = IoSerial<BufferedUartRx<'static>>;

/// Wrap a receiver configured at `baud_rate`
pub fn gps_serial(rx: BufferedUartRx<'static>, baud_rate: u32) -> GpsSerial {
    IoSerial::new(rx, baud_rate).with_baud_hook(set_baud)
}

fn set_baud(rx: &mut BufferedUartRx<'static>, baud_rate: u32) {
    // An unreachable rate keeps the previous one; checksums catch the rest
    let _ = rx.set_baudrate(baud_rate);
}
