//! Real serial transport.
//!
//! Adapts a [`serialport`] handle to the `embedded_io` interface the
//! session is generic over, and opens the port with the fixed line
//! settings the LW-3010EC ships with (9600 baud, 8N1). The port's read
//! timeout doubles as the transaction timeout.

use log::debug;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use crate::config::Config;

/// USB vendor/product ids of serial adapters the supply is known to ship
/// with (CH340 and FT232 variants).
const KNOWN_ADAPTERS: [(u16, u16); 2] = [(0x1A86, 0x7523), (0x0403, 0x6001)];

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted => embedded_io::ErrorKind::ConnectionAborted,
            std::io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
            std::io::ErrorKind::AddrInUse => embedded_io::ErrorKind::AddrInUse,
            std::io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

/// Open the configured port with the device's fixed line settings.
pub fn open_port(config: &Config) -> Result<PortWrapper, serialport::Error> {
    debug!("opening {} at 9600 8N1", config.port);
    let port = serialport::new(&config.port, 9600)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.transaction_timeout())
        .open()?;
    Ok(PortWrapper(port))
}

/// Scan for USB serial adapters matching the supply's known VID/PID pairs
/// and return the most recently enumerated port name, if any.
pub fn find_supply_port() -> Option<String> {
    let ports = serialport::available_ports().ok()?;
    let mut candidates: Vec<String> = ports
        .into_iter()
        .filter(|p| match &p.port_type {
            SerialPortType::UsbPort(usb) => KNOWN_ADAPTERS.contains(&(usb.vid, usb.pid)),
            _ => false,
        })
        .map(|p| p.port_name)
        .collect();
    candidates.sort();
    candidates.pop()
}
