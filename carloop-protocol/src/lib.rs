//! Companion protocols layered on the Carloop CAN gateway
//!
//! - [`slcan`]: line-oriented ASCII CAN bridge, as spoken by Linux
//!   `slcand`, so the board can be used as a SocketCAN interface
//! - [`obd`]: OBD-II service 01 requests and reply matching
//!
//! Neither protocol is interpreted by the core; applications feed bytes in
//! and hand the resulting commands to the gateway.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod obd;
pub mod slcan;

pub use obd::{Pid, Poller};
pub use slcan::{Command, LineParser, SlcanError, LINE_END, MAX_LINE_LEN, NACK};
