//! Serial byte source abstraction
//!
//! The GPS receiver streams NMEA text over a UART. The ingest loop polls
//! for bytes without blocking, so the trait exposes an availability check
//! and a single-byte non-blocking read.

/// Non-blocking serial receiver
pub trait SerialPort {
    /// Start (or restart) the transport at the given baud rate
    fn begin(&mut self, baud_rate: u32);

    /// Check whether at least one byte can be read without blocking
    fn available(&mut self) -> bool;

    /// Read one byte if available
    ///
    /// Returns `None` when the receive buffer is empty. Line errors are
    /// reported as no data; the NMEA checksum catches any corruption.
    fn read(&mut self) -> Option<u8>;
}

/// Adapter for `embedded-io` readers
///
/// Any buffered UART receiver implementing `Read + ReadReady` becomes a
/// [`SerialPort`]. Changing the baud rate is chip specific, so it is
/// delegated to an optional hook.
pub struct IoSerial<R> {
    reader: R,
    baud_rate: u32,
    set_baud: Option<fn(&mut R, u32)>,
}

impl<R> IoSerial<R>
where
    R: embedded_io::Read + embedded_io::ReadReady,
{
    /// Wrap a reader already configured at `baud_rate`
    pub fn new(reader: R, baud_rate: u32) -> Self {
        Self {
            reader,
            baud_rate,
            set_baud: None,
        }
    }

    /// Install a hook that reconfigures the transport on `begin`
    pub fn with_baud_hook(mut self, hook: fn(&mut R, u32)) -> Self {
        self.set_baud = Some(hook);
        self
    }

    /// Baud rate of the last `begin` (or construction)
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl<R> SerialPort for IoSerial<R>
where
    R: embedded_io::Read + embedded_io::ReadReady,
{
    fn begin(&mut self, baud_rate: u32) {
        if baud_rate != self.baud_rate {
            if let Some(hook) = self.set_baud {
                hook(&mut self.reader, baud_rate);
            }
        }
        self.baud_rate = baud_rate;
    }

    fn available(&mut self) -> bool {
        self.reader.read_ready().unwrap_or(false)
    }

    fn read(&mut self) -> Option<u8> {
        if !self.available() {
            return None;
        }

        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }
}
