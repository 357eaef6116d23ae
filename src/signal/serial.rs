use super::SignalLink;
use serialport::{SerialPortInfo, SerialPortType};
use std::thread;
use std::time::Duration;

/// Substring of the USB descriptor that identifies the peripheral.
const VENDOR_MARKER: &str = "Arduino";
const BAUD_RATE: u32 = 9_600;
const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Grace period between enumeration and open, so the device finishes
/// re-enumerating before we grab it.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Scan the serial ports for the signal peripheral.
///
/// Logs every port seen, then opens the first whose USB strings contain
/// the vendor marker. Enumeration and open failures are logged and
/// skipped; when nothing matches the returned link is disconnected and
/// all later sends are no-ops.
pub fn detect() -> SignalLink {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            tracing::warn!("Serial port scan failed: {err}");
            return SignalLink::disconnected();
        }
    };

    tracing::info!("Available ports:");
    for info in &ports {
        tracing::info!("  {}: {}", info.port_name, describe(&info.port_type));
    }

    for info in ports {
        if !matches_vendor(&info) {
            continue;
        }
        tracing::info!("Signal peripheral found on {}", info.port_name);
        thread::sleep(SETTLE_DELAY);

        match open_port(&info.port_name) {
            Some(link) => return link,
            None => continue,
        }
    }

    tracing::info!("No signal peripheral found");
    SignalLink::disconnected()
}

/// Open a specific port, bypassing auto-detection. A failed open logs
/// and degrades to a disconnected link.
pub fn open(path: &str) -> SignalLink {
    open_port(path).unwrap_or_else(SignalLink::disconnected)
}

fn open_port(path: &str) -> Option<SignalLink> {
    match serialport::new(path, BAUD_RATE)
        .timeout(READ_TIMEOUT)
        .open()
    {
        Ok(port) => {
            tracing::info!("Connected to {path}");
            Some(SignalLink::connected(port))
        }
        Err(err) => {
            tracing::warn!("Failed to open {path}: {err}");
            None
        }
    }
}

fn matches_vendor(info: &SerialPortInfo) -> bool {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => {
            usb.product
                .as_deref()
                .is_some_and(|p| p.contains(VENDOR_MARKER))
                || usb
                    .manufacturer
                    .as_deref()
                    .is_some_and(|m| m.contains(VENDOR_MARKER))
        }
        _ => false,
    }
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => format!(
            "USB {:04x}:{:04x} {}",
            usb.vid,
            usb.pid,
            usb.product.as_deref().unwrap_or("unknown")
        ),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}
