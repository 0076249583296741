//! Error types for LW-3010EC communications.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Errors produced by the transport session and the device client.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    /// The serial interface itself failed.
    #[error("serial communication error")]
    Serial(I),
    /// The response frame could not be decoded (bad CRC, broken frame,
    /// or a Modbus exception from the slave).
    #[error("modbus protocol error: {0}")]
    Modbus(rmodbus::ErrorKind),
    /// No (or not enough) response arrived within the transaction timeout.
    #[error("communication timeout")]
    Timeout,
    /// A response arrived but did not match the request it answers.
    #[error("invalid response received")]
    InvalidResponse,
    /// A set-point was rejected locally before any transaction was issued.
    #[error("requested value {requested} outside device limit {limit}")]
    OutOfRange { requested: u16, limit: u16 },
}

impl<I: embedded_io::Error> Error<I> {
    /// True for failures that happened on (or waiting for) the wire, as
    /// opposed to local validation. The dispatcher's retry policy only
    /// ever applies to transport failures of poll reads.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Error::OutOfRange { .. })
    }
}

impl<I: embedded_io::Error> From<rmodbus::ErrorKind> for Error<I> {
    fn from(err: rmodbus::ErrorKind) -> Self {
        Error::Modbus(err)
    }
}
