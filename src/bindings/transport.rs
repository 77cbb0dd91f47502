//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - UART serial ([`UartTransport`](crate::adapters::uart::UartTransport))
//! - in-memory loopback in tests
//!
//! The serial binding is generic over `Transport`, so adding a new
//! byte channel requires zero changes to the command handling.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Push buffered output towards the wire.
    ///
    /// Must return without waiting for the bytes to be sent: the serial
    /// binding calls this from the control loop.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// A null transport that discards all writes and never reads.
/// Lets the serial binding run with no port attached.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }
}

/// Write all of `data`, retrying short writes.
///
/// Gives up after a write that makes no progress so a stalled host can
/// never wedge the control loop.
pub fn write_all<T: Transport>(transport: &mut T, mut data: &[u8]) -> Result<(), T::Error> {
    while !data.is_empty() {
        let n = transport.write(data)?;
        if n == 0 {
            break;
        }
        data = &data[n.min(data.len())..];
    }
    transport.flush()
}
