mod serial;

pub use serial::{detect, open};

use serialport::SerialPort;
use std::io::Write;

/// Signal line commands understood by the peripheral. One byte each, no
/// framing, no acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Drive the line high.
    Raise,
    /// Drive the line low.
    Lower,
}

impl Signal {
    fn command(self) -> u8 {
        match self {
            Signal::Raise => b'H',
            Signal::Lower => b'L',
        }
    }
}

/// Best-effort handle to the external signal peripheral.
///
/// Holds the open port when one was detected at startup; otherwise every
/// [`send`](Self::send) is a silent no-op. A failed write logs and drops
/// the handle, so later sends degrade to no-ops as well. Never retried,
/// never fatal.
pub struct SignalLink {
    port: Option<Box<dyn SerialPort>>,
}

impl SignalLink {
    pub fn connected(port: Box<dyn SerialPort>) -> Self {
        Self { port: Some(port) }
    }

    pub fn disconnected() -> Self {
        Self { port: None }
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    /// Send a one-byte command if a peripheral is held.
    pub fn send(&mut self, signal: Signal) {
        let Some(port) = self.port.as_mut() else {
            return;
        };
        if let Err(err) = port.write_all(&[signal.command()]) {
            tracing::warn!("Peripheral write failed, dropping connection: {err}");
            self.port = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes_are_fixed() {
        assert_eq!(Signal::Raise.command(), b'H');
        assert_eq!(Signal::Lower.command(), b'L');
    }

    #[test]
    fn disconnected_sends_are_noops() {
        let mut link = SignalLink::disconnected();
        assert!(!link.is_connected());
        link.send(Signal::Raise);
        link.send(Signal::Lower);
        assert!(!link.is_connected());
    }
}
