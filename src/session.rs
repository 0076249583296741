//! Modbus-RTU transport session.
//!
//! Owns the serial interface and executes exactly one transaction at a
//! time, which is the discipline half-duplex RTU framing demands of a
//! single-master bus: the `&mut self` receiver makes concurrent
//! transactions unrepresentable. The transaction timeout is enforced by
//! the underlying interface's read timeout; this layer never retries.

use crate::error::{Error, Result};
use embedded_io::Error as _;

/// One serialized request/response session against a single slave.
///
/// `S` is any interface implementing [`embedded_io::Read`] and
/// [`embedded_io::Write`]; `L` is the frame buffer capacity.
pub struct RtuSession<S: embedded_io::Read + embedded_io::Write, const L: usize = 128> {
    pub(crate) interface: S,
    /// Slave address, factory default 1. Address 0 is broadcast and is
    /// never used for reads.
    unit_id: u8,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> RtuSession<S, L> {
    pub fn new(interface: S, unit_id: u8) -> Self {
        Self { interface, unit_id }
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Read `count` contiguous holding registers starting at `address`.
    pub fn read_holdings(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<heapless::Vec<u16, 16>, S::Error> {
        let mut frame: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_get_holdings(address, count, &mut frame)?;

        self.interface.write_all(&frame).map_err(Error::Serial)?;

        // Response: unit + function + byte count + 2 bytes per register + CRC.
        let expected = 5 + 2 * count as usize;
        frame.clear();
        self.collect_response(expected, &mut frame)?;

        let mut values: heapless::Vec<u16, 16> = heapless::Vec::new();
        req.parse_u16(&frame, &mut values)?;
        if values.len() < count as usize {
            return Err(Error::InvalidResponse);
        }
        Ok(values)
    }

    /// Write a single holding register.
    pub fn write_holding(&mut self, address: u16, value: u16) -> Result<(), S::Error> {
        let mut frame: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_set_holding(address, value, &mut frame)?;

        self.interface.write_all(&frame).map_err(Error::Serial)?;

        // The slave acknowledges a single-register write by echoing the
        // request frame verbatim.
        let mut response: heapless::Vec<u8, L> = heapless::Vec::new();
        self.collect_response(frame.len(), &mut response)?;
        if response.as_slice() != frame.as_slice() {
            return Err(Error::InvalidResponse);
        }
        Ok(())
    }

    /// Write multiple contiguous holding registers as one transaction.
    ///
    /// The Modbus "write multiple registers" function commits all
    /// addressed registers or none; there is no partial write to expose.
    pub fn write_holdings(&mut self, address: u16, values: &[u16]) -> Result<(), S::Error> {
        let mut frame: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_set_holdings_bulk(address, values, &mut frame)?;

        self.interface.write_all(&frame).map_err(Error::Serial)?;

        // Acknowledgement carries unit, function, start address and
        // register count: the first six bytes of the request.
        let mut response: heapless::Vec<u8, L> = heapless::Vec::new();
        self.collect_response(8, &mut response)?;
        if response.len() < 6 || response.as_slice()[..6] != frame.as_slice()[..6] {
            return Err(Error::InvalidResponse);
        }
        Ok(())
    }

    /// Accumulate response bytes until `expected` are buffered or the
    /// interface reports end-of-response (timeout / no more data).
    ///
    /// A short-but-nonempty buffer is handed to the caller anyway: Modbus
    /// exception frames are shorter than the success frame and must reach
    /// the parser rather than masquerade as timeouts.
    fn collect_response(
        &mut self,
        expected: usize,
        buf: &mut heapless::Vec<u8, L>,
    ) -> Result<(), S::Error> {
        let mut chunk = [0u8; 16];
        while buf.len() < expected {
            match self.interface.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if buf.extend_from_slice(&chunk[..n]).is_err() {
                        return Err(Error::InvalidResponse);
                    }
                }
                Err(e) => match e.kind() {
                    embedded_io::ErrorKind::TimedOut | embedded_io::ErrorKind::Other => break,
                    _ => return Err(Error::Serial(e)),
                },
            }
        }
        if buf.is_empty() {
            return Err(Error::Timeout);
        }
        // Anything shorter than the minimal exception frame cannot be parsed.
        if buf.len() < 5 {
            return Err(Error::Timeout);
        }
        Ok(())
    }
}
