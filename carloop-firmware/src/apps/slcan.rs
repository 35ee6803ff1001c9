//! SLCAN bridge over USB CDC-ACM
//!
//! Turns the board into a SocketCAN adapter (`slcand -o -c -s6 /dev/ttyACM0`).
//! Host lines drive the CAN gateway and every received frame is written
//! back to the host while the channel is open.

use carloop_core::Carloop;
use carloop_protocol::slcan::encode_frame_to_vec;
use carloop_protocol::{Command, LineParser, LINE_END, NACK};
use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use embassy_usb::driver::EndpointError;

use crate::board::Photon;
use crate::tasks::usb::{UsbSerial, MAX_PACKET_SIZE};

/// How long to wait for host bytes before servicing CAN
const HOST_POLL: Duration = Duration::from_millis(1);

pub async fn run(mut carloop: Carloop<Photon>, mut serial: UsbSerial) -> ! {
    info!("SLCAN app started");

    loop {
        serial.wait_connection().await;
        info!("SLCAN host connected");
        if let Err(e) = session(&mut carloop, &mut serial).await {
            info!("SLCAN host disconnected: {}", e);
        }
        // Never leave the bus driven after the host goes away
        carloop.disable_can();
    }
}

async fn session(
    carloop: &mut Carloop<Photon>,
    serial: &mut UsbSerial,
) -> Result<(), EndpointError> {
    let mut parser = LineParser::new();
    let mut rx = [0u8; MAX_PACKET_SIZE as usize];

    loop {
        carloop.update();

        match select(serial.read_packet(&mut rx), Timer::after(HOST_POLL)).await {
            Either::First(n) => {
                for &byte in &rx[..n?] {
                    let reply = match parser.feed(byte) {
                        Ok(Some(command)) => apply(carloop, command),
                        Ok(None) => None,
                        Err(e) => {
                            debug!("SLCAN rejected line: {}", e);
                            Some(NACK)
                        }
                    };
                    if let Some(reply) = reply {
                        serial.write_packet(&[reply]).await?;
                    }
                }
            }
            Either::Second(()) => {}
        }

        forward_frames(carloop, serial).await?;
    }
}

/// Execute one host command, returning the status byte to send back
fn apply(carloop: &mut Carloop<Photon>, command: Command) -> Option<u8> {
    match command {
        Command::Open => {
            carloop.enable_can();
            Some(LINE_END)
        }
        Command::Close => {
            carloop.disable_can();
            Some(LINE_END)
        }
        Command::SetBitrate(bitrate) => {
            carloop.set_can_speed(bitrate);
            Some(LINE_END)
        }
        Command::Transmit(message) => match carloop.can().transmit(&message) {
            Ok(()) => Some(LINE_END),
            Err(e) => {
                debug!("SLCAN transmit failed: {}", e);
                Some(NACK)
            }
        },
    }
}

async fn forward_frames(
    carloop: &mut Carloop<Photon>,
    serial: &mut UsbSerial,
) -> Result<(), EndpointError> {
    while let Some(message) = carloop.can().receive() {
        match encode_frame_to_vec(&message) {
            Ok(line) => serial.write_packet(&line).await?,
            Err(e) => warn!("SLCAN encode failed: {}", e),
        }
    }
    Ok(())
}
