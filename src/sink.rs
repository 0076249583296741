//! Contract between the dispatcher and the presentation layer.

use crate::types::{ChangedFields, StatusSnapshot};

/// One delivered status change: the full snapshot plus the set of fields
/// that differ from the previously delivered snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub snapshot: StatusSnapshot,
    pub changed: ChangedFields,
}

/// Why a user command did not take effect on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// Local validation rejected the request; nothing was sent on the wire.
    Rejected { requested: u16, limit: u16 },
    /// The device transaction failed (timeout, framing, CRC).
    Transport { detail: String },
}

/// Receiver of dispatcher notifications, implemented by the GUI/CLI layer.
///
/// `on_status_changed` is invoked at most once per dispatcher cycle, and
/// only when at least one field changed. Implementations must not block:
/// both callbacks run on the dispatcher thread, between device
/// transactions.
pub trait StatusSink: Send {
    fn on_status_changed(&mut self, update: &StatusUpdate);
    fn on_command_failed(&mut self, failure: &CommandFailure);
}
