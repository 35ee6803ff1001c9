//! GPS state shared between the ingest task and foreground readers
//!
//! The serial source and the parser live behind one blocking mutex. The
//! ingest task holds it for a whole drain, readers hold it for a whole
//! multi-field read. Acquisition is closure-scoped, so the lock is released
//! on every exit path of the closure, including an unwinding panic.

use core::cell::RefCell;

use carloop_hal::SerialPort;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::parser::{GpsParser, GpsSnapshot};

struct GpsLink<S, P> {
    serial: S,
    parser: P,
}

/// Mutex-guarded GPS serial link and parser
pub struct SharedGps<M, S, P> {
    inner: Mutex<M, RefCell<GpsLink<S, P>>>,
}

impl<M: RawMutex, S, P> SharedGps<M, S, P> {
    /// Wrap a serial source and a parser
    ///
    /// This is a const fn, allowing static initialization.
    pub const fn new(serial: S, parser: P) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(GpsLink { serial, parser })),
        }
    }
}

impl<M: RawMutex, S: SerialPort, P: GpsParser> SharedGps<M, S, P> {
    /// Run `f` on the parser while holding the ingest lock
    ///
    /// Use this for any read touching more than one field:
    ///
    /// ```ignore
    /// let (fix, date) = gps.lock(|p| (p.location(), p.date()));
    /// ```
    pub fn lock<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        self.inner.lock(|cell| f(&cell.borrow().parser))
    }

    /// Copy every parser field in one critical section
    pub fn snapshot(&self) -> GpsSnapshot {
        self.lock(GpsSnapshot::capture)
    }

    /// Drain all bytes currently available into the parser
    ///
    /// Returns the number of bytes decoded.
    pub fn ingest(&self) -> usize {
        self.inner.lock(|cell| {
            let mut link = cell.borrow_mut();
            let GpsLink { serial, parser } = &mut *link;

            let mut count = 0;
            while let Some(byte) = serial.read() {
                parser.encode(byte);
                count += 1;
            }
            count
        })
    }

    /// (Re)start the serial transport
    pub(crate) fn begin_serial(&self, baud_rate: u32) {
        self.inner.lock(|cell| cell.borrow_mut().serial.begin(baud_rate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockParser, MockSerial};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type TestGps = SharedGps<CriticalSectionRawMutex, MockSerial, MockParser>;

    #[test]
    fn test_ingest_drains_everything() {
        let serial = MockSerial::new();
        serial.push(b"3\n4\n");
        let gps = TestGps::new(serial.clone(), MockParser::default());

        assert_eq!(gps.ingest(), 4);
        assert_eq!(gps.ingest(), 0);

        let snap = gps.snapshot();
        assert_eq!(snap.chars_processed, 4);
        assert_eq!(snap.passed_checksum, 2);
        assert_eq!(snap.location.lat(), 4.0);
        assert_eq!(snap.date.day(), 4);
        assert!(serial.is_empty());
    }

    #[test]
    fn test_begin_reaches_serial() {
        let serial = MockSerial::new();
        let gps = TestGps::new(serial.clone(), MockParser::default());

        gps.begin_serial(9600);
        assert_eq!(serial.baud(), Some(9600));
    }

    #[test]
    fn test_lock_released_after_panic() {
        let gps = TestGps::new(MockSerial::new(), MockParser::default());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            gps.lock(|_| panic!("reader failed"));
        }));
        assert!(result.is_err());

        // Both the mutex and the RefCell borrow must be free again
        assert_eq!(gps.ingest(), 0);
        assert_eq!(gps.snapshot().chars_processed, 0);
    }
}
