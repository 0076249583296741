//! Fixed-cadence poll ticks.
//!
//! The poller never touches the serial link. It only meters out ticks on
//! a capacity-one channel; the dispatcher performs the actual status read
//! when it consumes a tick. A tick that arrives while the previous one is
//! still unconsumed is dropped, so the poll period is a floor on
//! inter-poll spacing, never a backlog.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, TrySendError, bounded};
use log::{info, trace};

/// Marker delivered once per elapsed poll period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTick;

/// Spawn the poll thread. It runs until `shutdown` is raised or the
/// receiving side hangs up.
pub fn spawn(
    interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<(Receiver<PollTick>, JoinHandle<()>)> {
    let (tx, rx) = bounded(1);
    let handle = thread::Builder::new()
        .name("psu-poller".into())
        .spawn(move || {
            info!("poller running, interval {} ms", interval.as_millis());
            loop {
                thread::sleep(interval);
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                match tx.try_send(PollTick) {
                    Ok(()) => {}
                    // Previous tick not consumed yet: skip this one.
                    Err(TrySendError::Full(_)) => trace!("dispatcher busy, poll tick skipped"),
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            info!("poller stopped");
        })?;
    Ok((rx, handle))
}
