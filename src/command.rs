//! User command intake.
//!
//! Commands are value objects created by the interface layer and consumed
//! exactly once by the dispatcher; ownership transfers on submit. The
//! queue is FIFO, unbounded and multi-producer, so submitting never
//! blocks an interface thread.

use crossbeam_channel::{Receiver, Sender, unbounded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Apply a new set-point pair, optionally cycling the output relay
    /// around the write. Raw values, validated by the device client.
    SetPoints {
        voltage_raw: u16,
        current_raw: u16,
        disable_before: bool,
        enable_after: bool,
    },
    /// Invert the output relay.
    ToggleOutput,
    /// Stop delivering device set-point changes to the sink; the interface
    /// is editing values locally.
    LocalOverride,
    /// Resume tracking device set-points. The next delivered update always
    /// carries the set-point fields so the display resynchronizes.
    ResumeTracking,
    /// Stop the dispatcher and signal shutdown to the poller.
    Quit,
}

/// Cloneable producer half of the command queue.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Hand a command to the dispatcher. Never blocks; returns `false`
    /// once the dispatcher has shut down and will no longer consume.
    pub fn submit(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Build the command queue: one cloneable sender for the interface side,
/// one receiver owned by the dispatcher.
pub fn channel() -> (CommandSender, Receiver<Command>) {
    let (tx, rx) = unbounded();
    (CommandSender { tx }, rx)
}
