//! UART transport adapter.
//!
//! Implements [`Transport`] for the serial command port.
//!
//! - **`target_os = "espidf"`**: wraps an `esp-idf-hal` [`UartDriver`]
//!   (UART1, TX/RX from [`pins`](crate::pins)).  Neither side blocks:
//!   reads take what the RX ring holds, writes copy into the TX ring and
//!   the driver drains it in the background.
//! - **`not(target_os = "espidf")`**: an in-memory port.  Bytes pushed with
//!   [`inject`](UartTransport::inject) are read back by the binding and
//!   everything written is collected for [`take_output`](UartTransport::take_output).

use crate::bindings::transport::Transport;

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    delay::NON_BLOCK,
    sys::{ESP_ERR_TIMEOUT, EspError},
    uart::UartDriver,
};

/// Serial command port.
pub struct UartTransport {
    #[cfg(target_os = "espidf")]
    driver: UartDriver<'static>,

    #[cfg(not(target_os = "espidf"))]
    rx: std::collections::VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<u8>,
}

#[cfg(target_os = "espidf")]
impl UartTransport {
    pub fn new(driver: UartDriver<'static>) -> Self {
        Self { driver }
    }
}

#[cfg(target_os = "espidf")]
impl Transport for UartTransport {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.driver.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.driver.write(data)
    }

    /// Only checks the TX ring; bytes still on the wire are not waited for.
    fn flush(&mut self) -> Result<(), EspError> {
        match self.driver.wait_tx_done(NON_BLOCK) {
            Err(e) if e.code() == ESP_ERR_TIMEOUT as i32 => Ok(()),
            other => other,
        }
    }

    fn available(&self) -> bool {
        self.driver.remaining_read().is_ok_and(|n| n > 0)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for UartTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl UartTransport {
    pub fn new() -> Self {
        Self {
            rx: std::collections::VecDeque::new(),
            tx: Vec::new(),
        }
    }

    /// Queue bytes as if the host had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Drain everything written since the last call.
    pub fn take_output(&mut self) -> String {
        String::from_utf8_lossy(&core::mem::take(&mut self.tx)).into_owned()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Transport for UartTransport {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}
