//! Lifecycle orchestration.
//!
//! Validates configuration and opens the port before spawning anything,
//! so startup failures terminate with no threads to clean up. Once
//! running, the dispatcher thread is the only task holding the session;
//! everything else talks to it through channels.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};

use log::info;
use thiserror::Error;

use crate::command::{self, Command, CommandSender};
use crate::config::{Config, ConfigError};
use crate::dispatcher::Dispatcher;
use crate::poller;
use crate::psu::LwPsu;
use crate::serial::{self, PortWrapper};
use crate::sink::StatusSink;

#[derive(Error, Debug)]
pub enum StartError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("serial port unavailable: {0}")]
    PortUnavailable(#[from] serialport::Error),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle to the running poller and dispatcher threads.
pub struct Controller {
    sender: CommandSender,
    poller: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl Controller {
    /// Start the controller: validate, open the port, spawn the poller
    /// and dispatcher. Any failure here happens before a thread exists.
    pub fn start<K>(config: &Config, sink: K) -> Result<Self, StartError>
    where
        K: StatusSink + 'static,
    {
        config.validate()?;
        let port = serial::open_port(config)?;
        let psu: LwPsu<PortWrapper> = LwPsu::new(port, config.slave_address);

        let shutdown = Arc::new(AtomicBool::new(false));
        let (sender, commands) = command::channel();
        let (ticks, poller) = poller::spawn(config.poll_interval(), shutdown.clone())?;

        let dispatcher = Dispatcher::new(psu, commands, ticks, sink, shutdown);
        let dispatcher = thread::Builder::new()
            .name("psu-dispatcher".into())
            .spawn(move || {
                // The session comes back when the loop ends and is dropped
                // here, closing the port.
                let _ = dispatcher.run();
            })?;

        info!(
            "controller started on {} (slave {})",
            config.port, config.slave_address
        );
        Ok(Self {
            sender,
            poller,
            dispatcher,
        })
    }

    /// Hand a command to the dispatcher; never blocks. Returns `false` if
    /// the dispatcher has already stopped.
    pub fn submit(&self, command: Command) -> bool {
        self.sender.submit(command)
    }

    /// A cloneable sender for interface threads to keep.
    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Stop both threads: queue `Quit` and wait for the dispatcher to
    /// finish its in-flight transaction, raise the shutdown flag and
    /// release the port, then for the poller to observe the flag.
    pub fn shutdown(self) {
        self.sender.submit(Command::Quit);
        let _ = self.dispatcher.join();
        let _ = self.poller.join();
        info!("controller stopped");
    }
}
