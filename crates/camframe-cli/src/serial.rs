use std::io::{ErrorKind, Read};
use std::time::Duration;

use camframe_core::{ByteSource, SourceError, SourceRead};
use serialport::{SerialPort, SerialPortType};

/// Baud rate the camera firmware transmits at.
pub const DEFAULT_BAUD: u32 = 921_600;

/// Live camera link. The port is released when the source is dropped.
pub struct SerialSource {
    name: String,
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    pub fn open(name: &str, baud: u32, timeout: Duration) -> Result<Self, serialport::Error> {
        let port = serialport::new(name, baud).timeout(timeout).open()?;
        tracing::info!(port = name, baud, "serial port opened");
        Ok(Self {
            name: name.to_string(),
            port,
        })
    }
}

impl ByteSource for SerialSource {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<SourceRead, SourceError> {
        match self.port.read(buf) {
            Ok(0) => Ok(SourceRead::Idle),
            Ok(n) => Ok(SourceRead::Data(n)),
            Err(err) => classify_read_error(&self.name, err),
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Timeouts are an idle link; a vanished device is reported as such.
fn classify_read_error(name: &str, err: std::io::Error) -> Result<SourceRead, SourceError> {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted => {
            Ok(SourceRead::Idle)
        }
        ErrorKind::BrokenPipe
        | ErrorKind::NotConnected
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotFound => Err(SourceError::Device(format!("{name} disconnected: {err}"))),
        _ => Err(SourceError::Io(err)),
    }
}

impl Drop for SerialSource {
    fn drop(&mut self) {
        tracing::info!(port = %self.name, "serial port closed");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    pub description: String,
}

pub fn list_ports() -> Result<Vec<PortInfo>, serialport::Error> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| match port.port_type {
            SerialPortType::UsbPort(info) => {
                let mut description = format!("USB {:04x}:{:04x}", info.vid, info.pid);
                for part in [info.manufacturer, info.product].into_iter().flatten() {
                    description.push(' ');
                    description.push_str(&part);
                }
                PortInfo {
                    name: port.port_name,
                    kind: "usb",
                    description,
                }
            }
            SerialPortType::BluetoothPort => PortInfo {
                name: port.port_name,
                kind: "bluetooth",
                description: String::new(),
            },
            SerialPortType::PciPort => PortInfo {
                name: port.port_name,
                kind: "pci",
                description: String::new(),
            },
            SerialPortType::Unknown => PortInfo {
                name: port.port_name,
                kind: "unknown",
                description: String::new(),
            },
        })
        .collect())
}

/// Prefer an STM32 device, then any USB adapter, then the first port.
pub fn auto_select(ports: &[PortInfo]) -> Option<&PortInfo> {
    let mentions = |port: &&PortInfo, needle: &str| port.description.to_uppercase().contains(needle);
    ports
        .iter()
        .find(|port| mentions(port, "STM32"))
        .or_else(|| ports.iter().find(|port| mentions(port, "USB")))
        .or_else(|| ports.first())
}

#[cfg(test)]
mod tests {
    use std::io::{Error, ErrorKind};

    use camframe_core::{SourceError, SourceRead};

    use super::{PortInfo, auto_select, classify_read_error};

    fn port(name: &str, description: &str) -> PortInfo {
        PortInfo {
            name: name.to_string(),
            kind: "usb",
            description: description.to_string(),
        }
    }

    #[test]
    fn prefers_stm32_device() {
        let ports = vec![
            port("/dev/ttyS0", ""),
            port("/dev/ttyUSB0", "USB 0403:6001 FTDI"),
            port("/dev/ttyACM0", "USB 0483:5740 STMicroelectronics STM32 Virtual ComPort"),
        ];
        assert_eq!(auto_select(&ports).unwrap().name, "/dev/ttyACM0");
    }

    #[test]
    fn falls_back_to_usb_then_first() {
        let ports = vec![port("COM1", ""), port("COM7", "USB 1a86:7523")];
        assert_eq!(auto_select(&ports).unwrap().name, "COM7");

        let ports = vec![port("COM1", ""), port("COM2", "")];
        assert_eq!(auto_select(&ports).unwrap().name, "COM1");
        assert!(auto_select(&[]).is_none());
    }

    #[test]
    fn timeouts_are_idle() {
        let read = classify_read_error("COM3", Error::from(ErrorKind::TimedOut));
        assert_eq!(read.unwrap(), SourceRead::Idle);
    }

    #[test]
    fn unplugged_device_is_a_device_error() {
        let err = classify_read_error("/dev/ttyACM0", Error::from(ErrorKind::BrokenPipe))
            .unwrap_err();
        assert!(matches!(&err, SourceError::Device(message) if message.contains("/dev/ttyACM0")));

        let err = classify_read_error("COM3", Error::from(ErrorKind::PermissionDenied)).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
