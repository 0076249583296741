//! Test double emulating the supply's RTU slave side behind a serial port.
//!
//! Each `write` call is treated as one request frame (the session writes
//! whole frames). The mock answers like the real firmware: reads are
//! served from a queue of register blocks, writes are acknowledged with
//! the protocol echo. Failure injection covers silent (timed-out) and
//! corrupted transactions.

use std::collections::VecDeque;

pub struct MockSupply {
    requests: Vec<Vec<u8>>,
    pending: VecDeque<u8>,
    holdings: VecDeque<Vec<u16>>,
    drop_transactions: Vec<usize>,
    corrupt_next: bool,
    transaction: usize,
}

#[derive(Debug)]
pub enum MockSupplyError {
    /// No data available - the session treats this as end-of-response.
    WouldBlock,
}

impl core::fmt::Display for MockSupplyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockSupplyError::WouldBlock => write!(f, "would block"),
        }
    }
}

impl core::error::Error for MockSupplyError {}

impl embedded_io::Error for MockSupplyError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSupplyError::WouldBlock => embedded_io::ErrorKind::TimedOut,
        }
    }
}

impl embedded_io::ErrorType for MockSupply {
    type Error = MockSupplyError;
}

impl MockSupply {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            pending: VecDeque::new(),
            holdings: VecDeque::new(),
            drop_transactions: Vec::new(),
            corrupt_next: false,
            transaction: 0,
        }
    }

    /// Queue one register block to answer the next holding-register read.
    /// Reads with nothing queued go unanswered (the session times out).
    pub fn queue_holdings(&mut self, values: &[u16]) {
        self.holdings.push_back(values.to_vec());
    }

    /// Swallow the listed transactions (1-based, counted across all
    /// requests): the request is recorded but no response is produced.
    pub fn drop_transactions(&mut self, indices: &[usize]) {
        self.drop_transactions.extend_from_slice(indices);
    }

    /// Flip the last byte of the next response, breaking its CRC (reads)
    /// or its echo (writes).
    pub fn corrupt_next_response(&mut self) {
        self.corrupt_next = true;
    }

    /// All request frames written by the client, in order.
    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }

    /// Function codes of all requests, in order. Convenient for asserting
    /// transaction sequences.
    pub fn request_functions(&self) -> Vec<u8> {
        self.requests.iter().map(|f| f[1]).collect()
    }

    fn respond(&mut self, frame: &[u8]) {
        let mut response = match frame[1] {
            // Read holding registers: answer from the queued blocks.
            0x03 => match self.holdings.pop_front() {
                Some(values) => {
                    let mut resp = vec![frame[0], 0x03, (values.len() * 2) as u8];
                    for v in &values {
                        resp.extend_from_slice(&v.to_be_bytes());
                    }
                    let crc = crc16(&resp);
                    resp.extend_from_slice(&crc.to_le_bytes());
                    resp
                }
                None => return,
            },
            // Write single register: echo the request verbatim.
            0x06 => frame.to_vec(),
            // Write multiple registers: echo unit, function, address, count.
            0x10 => {
                let mut resp = frame[..6].to_vec();
                let crc = crc16(&resp);
                resp.extend_from_slice(&crc.to_le_bytes());
                resp
            }
            _ => return,
        };
        if self.corrupt_next {
            self.corrupt_next = false;
            if let Some(last) = response.last_mut() {
                *last ^= 0xFF;
            }
        }
        self.pending.extend(response);
    }
}

impl Default for MockSupply {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_io::Write for MockSupply {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.transaction += 1;
        self.requests.push(buf.to_vec());
        if !self.drop_transactions.contains(&self.transaction) && buf.len() >= 6 {
            self.respond(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for MockSupply {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.pending.is_empty() {
            return Err(MockSupplyError::WouldBlock);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.pending.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/// Standard Modbus CRC-16 (polynomial 0xA001), appended little-endian.
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Read, Write};

    #[test]
    fn known_crc_vector() {
        // Read-holdings request 01 03 00 20 00 01 has CRC 0x85 0xC0 on
        // the wire (low byte first).
        let frame = [0x01, 0x03, 0x00, 0x20, 0x00, 0x01];
        assert_eq!(crc16(&frame).to_le_bytes(), [0x85, 0xC0]);
    }

    #[test]
    fn answers_read_from_queue() {
        let mut mock = MockSupply::new();
        mock.queue_holdings(&[0x5678]);

        let request = [0x01, 0x03, 0x00, 0x20, 0x00, 0x01, 0x85, 0xC0];
        mock.write(&request).unwrap();

        let mut buf = [0u8; 16];
        let n = mock.read(&mut buf).unwrap();
        // unit + function + byte count + 2 data bytes + 2 CRC bytes
        assert_eq!(n, 7);
        assert_eq!(&buf[..5], &[0x01, 0x03, 0x02, 0x56, 0x78]);
    }

    #[test]
    fn unanswered_read_would_block() {
        let mut mock = MockSupply::new();
        let request = [0x01, 0x03, 0x00, 0x20, 0x00, 0x01, 0x85, 0xC0];
        mock.write(&request).unwrap();

        let mut buf = [0u8; 16];
        assert!(mock.read(&mut buf).is_err());
    }

    #[test]
    fn echoes_single_write() {
        let mut mock = MockSupply::new();
        let request = [0x01, 0x06, 0x10, 0x06, 0x00, 0x01, 0xAA, 0xBB];
        mock.write(&request).unwrap();

        let mut buf = [0u8; 16];
        let n = mock.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &request);
    }

    #[test]
    fn dropped_transaction_records_request() {
        let mut mock = MockSupply::new();
        mock.queue_holdings(&[1]);
        mock.drop_transactions(&[1]);

        let request = [0x01, 0x03, 0x00, 0x20, 0x00, 0x01, 0x85, 0xC0];
        mock.write(&request).unwrap();
        assert_eq!(mock.requests().len(), 1);

        let mut buf = [0u8; 16];
        assert!(mock.read(&mut buf).is_err());
    }
}
