//! Controller for the Longwei LW-3010EC programmable bench power supply.
//!
//! Talks Modbus RTU over the supply's serial port and runs a small
//! concurrent pipeline around it: a poller samples the six status
//! registers at a fixed cadence, a dispatcher serializes those polls with
//! asynchronously submitted user commands into one ordered transaction
//! stream, and field-diffed status updates are delivered to a
//! [`StatusSink`] implemented by the presentation layer.
//!
//! It should also work with compatible Longwei models (LW-6010EC,
//! LW-10010EC and similar) that expose the same register table, though
//! the voltage/current limits are the 3010's.
//!
//! The serial link is fixed by the device firmware:
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//! * Factory default slave address: 1
//!
//! # Example
//!
//! ```no_run
//! use lw3010ec::{Command, Config, Controller};
//! use lw3010ec::sink::{CommandFailure, StatusSink, StatusUpdate};
//!
//! struct PrintSink;
//!
//! impl StatusSink for PrintSink {
//!     fn on_status_changed(&mut self, update: &StatusUpdate) {
//!         println!(
//!             "{:.2} V / {:.2} A",
//!             lw3010ec::scaling::raw_to_display(update.snapshot.output_voltage_raw),
//!             lw3010ec::scaling::raw_to_display(update.snapshot.output_current_raw),
//!         );
//!     }
//!
//!     fn on_command_failed(&mut self, failure: &CommandFailure) {
//!         eprintln!("command failed: {failure:?}");
//!     }
//! }
//!
//! let mut config = Config::default();
//! config.port = "/dev/ttyUSB0".into();
//!
//! let controller = Controller::start(&config, PrintSink).unwrap();
//! controller.submit(Command::SetPoints {
//!     voltage_raw: 1200, // 12.00 V
//!     current_raw: 300,  // 3.00 A
//!     disable_before: true,
//!     enable_after: true,
//! });
//! controller.shutdown();
//! ```

pub mod command;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod poller;
pub mod psu;
pub mod registers;
pub mod scaling;
pub mod serial;
pub mod session;
pub mod sink;
pub mod types;

#[cfg(test)]
mod mock_serial;

pub use command::{Command, CommandSender};
pub use config::{Config, ConfigError};
pub use controller::{Controller, StartError};
pub use error::{Error, Result};
pub use psu::LwPsu;
pub use sink::{CommandFailure, StatusSink, StatusUpdate};
pub use types::{ChangedFields, OutputState, RegulationMode, StatusSnapshot};
