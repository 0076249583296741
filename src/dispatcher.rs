//! Event loop serializing all device access.
//!
//! The dispatcher is the single owner of the device client, so the
//! one-transaction-at-a-time discipline of the transport is structural:
//! no other task holds a handle to the serial link. Two inbound streams
//! feed it, the user command queue and the poller's tick channel. Each
//! cycle handles at most one command and then at most one tick, so a
//! command flood cannot starve status delivery and vice versa; when both
//! queues are empty it blocks until either produces.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, TryRecvError, select};
use log::{error, info, warn};

use crate::command::Command;
use crate::error::Error;
use crate::poller::PollTick;
use crate::psu::LwPsu;
use crate::sink::{CommandFailure, StatusSink, StatusUpdate};
use crate::types::{ChangedFields, OutputState, StatusSnapshot};

/// Whether the sink's set-point display follows the device or a value the
/// interface is holding locally (mid-edit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracking {
    TrackingDevice,
    HeldLocal,
}

/// What woke the blocking wait.
enum Inbound {
    Command(Command),
    Tick,
}

pub struct Dispatcher<S, K, const L: usize = 128>
where
    S: embedded_io::Read + embedded_io::Write,
    K: StatusSink,
{
    psu: LwPsu<S, L>,
    commands: Receiver<Command>,
    ticks: Receiver<PollTick>,
    sink: K,
    shutdown: Arc<AtomicBool>,
    last_delivered: Option<StatusSnapshot>,
    tracking: Tracking,
    /// Force the set-point fields into the next delivered change-set so
    /// the display resynchronizes after an override ends.
    refresh_set_points: bool,
}

impl<S, K, const L: usize> Dispatcher<S, K, L>
where
    S: embedded_io::Read + embedded_io::Write,
    K: StatusSink,
{
    pub fn new(
        psu: LwPsu<S, L>,
        commands: Receiver<Command>,
        ticks: Receiver<PollTick>,
        sink: K,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            psu,
            commands,
            ticks,
            sink,
            shutdown,
            last_delivered: None,
            tracking: Tracking::TrackingDevice,
            refresh_set_points: false,
        }
    }

    /// Run until `Quit` (or until both inbound channels hang up). Raises
    /// the shutdown flag on exit, stopping the poller, and hands the
    /// device client back so the caller can dispose of the port. The loop
    /// only ever breaks between transactions; an in-flight transaction
    /// always completes (or times out) first.
    pub fn run(mut self) -> LwPsu<S, L> {
        info!("dispatcher running, slave address {}", self.psu.unit_id());
        loop {
            let mut handled = false;

            match self.commands.try_recv() {
                Ok(command) => {
                    if !self.execute(command) {
                        break;
                    }
                    handled = true;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => break,
            }

            match self.ticks.try_recv() {
                Ok(PollTick) => {
                    self.poll();
                    handled = true;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => break,
            }

            if handled {
                continue;
            }

            // Both queues empty: block until either side produces.
            let inbound = select! {
                recv(self.commands) -> msg => msg.map(Inbound::Command),
                recv(self.ticks) -> msg => msg.map(|PollTick| Inbound::Tick),
            };
            match inbound {
                Ok(Inbound::Command(command)) => {
                    if !self.execute(command) {
                        break;
                    }
                }
                Ok(Inbound::Tick) => self.poll(),
                Err(_) => break,
            }
        }
        self.shutdown.store(true, Ordering::SeqCst);
        info!("dispatcher stopped");
        self.psu
    }

    /// Execute one command against the device. Returns `false` for `Quit`.
    fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::SetPoints {
                voltage_raw,
                current_raw,
                disable_before,
                enable_after,
            } => {
                match self
                    .psu
                    .apply_set_points(voltage_raw, current_raw, disable_before, enable_after)
                {
                    Ok(()) => {
                        self.tracking = Tracking::TrackingDevice;
                        self.refresh_set_points = true;
                        // The write itself changed device state; forward
                        // the delta without waiting for the next poll.
                        if let Some(prev) = self.last_delivered {
                            let mut next = prev;
                            next.set_voltage_raw = voltage_raw;
                            next.set_current_raw = current_raw;
                            if enable_after {
                                next.output_on = true;
                            } else if disable_before {
                                next.output_on = false;
                            }
                            self.deliver(next);
                        }
                    }
                    Err(Error::OutOfRange { requested, limit }) => {
                        warn!("set-points rejected: {requested} exceeds limit {limit}");
                        self.sink
                            .on_command_failed(&CommandFailure::Rejected { requested, limit });
                    }
                    // Never retried: the device may or may not have
                    // applied the write, and repeating it blind could
                    // double-apply.
                    Err(e) => {
                        error!("set-point write failed: {e}");
                        self.sink.on_command_failed(&CommandFailure::Transport {
                            detail: e.to_string(),
                        });
                    }
                }
            }
            Command::ToggleOutput => match self.psu.toggle_output() {
                Ok(state) => {
                    if let Some(prev) = self.last_delivered {
                        let mut next = prev;
                        next.output_on = matches!(state, OutputState::On);
                        self.deliver(next);
                    }
                }
                Err(e) => {
                    error!("output toggle failed: {e}");
                    self.sink.on_command_failed(&CommandFailure::Transport {
                        detail: e.to_string(),
                    });
                }
            },
            Command::LocalOverride => {
                self.tracking = Tracking::HeldLocal;
            }
            Command::ResumeTracking => {
                self.tracking = Tracking::TrackingDevice;
                self.refresh_set_points = true;
            }
            Command::Quit => return false,
        }
        true
    }

    /// One status read, with a single immediate retry on transport
    /// failure. A cycle that fails twice is logged and skipped; polling
    /// never stops.
    fn poll(&mut self) {
        let snapshot = match self.psu.read_status() {
            Ok(snapshot) => snapshot,
            Err(first) if first.is_transport() => {
                warn!("status poll failed, retrying once: {first}");
                match self.psu.read_status() {
                    Ok(snapshot) => snapshot,
                    Err(second) => {
                        warn!("status poll failed after retry, skipping cycle: {second}");
                        return;
                    }
                }
            }
            Err(other) => {
                warn!("status poll failed, skipping cycle: {other}");
                return;
            }
        };
        self.deliver(snapshot);
    }

    /// Diff against the previously delivered snapshot and notify the sink
    /// when anything changed. Field comparison is exact raw integer
    /// equality.
    fn deliver(&mut self, next: StatusSnapshot) {
        let mut changed = match &self.last_delivered {
            Some(prev) => ChangedFields::diff(prev, &next),
            None => ChangedFields::all(),
        };
        if self.tracking == Tracking::HeldLocal {
            // The interface is editing set-points; leave its display alone.
            changed.set_voltage = false;
            changed.set_current = false;
        } else if self.refresh_set_points {
            changed.set_voltage = true;
            changed.set_current = true;
            self.refresh_set_points = false;
        }
        if changed.any() {
            self.sink
                .on_status_changed(&StatusUpdate { snapshot: next, changed });
        }
        self.last_delivered = Some(next);
    }
}
