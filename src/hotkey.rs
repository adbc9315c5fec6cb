//! Polled global hotkeys with edge detection.
//!
//! The OS query reports whether a key is down *now* (a level), so the poller
//! remembers the previous level of each chord and only reports the poll on
//! which a chord goes from released to held.

use crate::config::{Config, HotkeyBindings};
use crate::error::Result;
use crate::keys::{Chord, Key};
use crate::platform::InputBackend;
use crate::priority::{self, ThreadPriority};
use crate::session::SessionCommand;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Released/pressed state of one chord across polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    was_down: bool,
}

impl EdgeDetector {
    /// Feed the current level; returns `true` only on a rising edge.
    pub fn update(&mut self, down: bool) -> bool {
        let rising = down && !self.was_down;
        self.was_down = down;
        rising
    }

    pub fn is_pressed(&self) -> bool {
        self.was_down
    }
}

/// Edge state for both chords; owned by the poller thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HotkeyEdgeState {
    pub start: EdgeDetector,
    pub stop: EdgeDetector,
}

impl HotkeyEdgeState {
    /// Commands fired by this pair of levels, start before stop.
    pub fn observe(&mut self, start_down: bool, stop_down: bool) -> Vec<SessionCommand> {
        let mut fired = Vec::new();
        if self.start.update(start_down) {
            fired.push(SessionCommand::Start);
        }
        if self.stop.update(stop_down) {
            fired.push(SessionCommand::Stop);
        }
        fired
    }
}

pub struct HotkeyPoller {
    backend: Arc<dyn InputBackend>,
    bindings: HotkeyBindings,
    poll_interval: Duration,
    backoff: Duration,
}

impl HotkeyPoller {
    pub fn new(
        backend: Arc<dyn InputBackend>,
        bindings: HotkeyBindings,
        poll_interval: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            backend,
            bindings,
            poll_interval,
            backoff,
        }
    }

    pub fn from_config(backend: Arc<dyn InputBackend>, config: &Config) -> Result<Self> {
        Ok(Self::new(
            backend,
            config.hotkey_bindings()?,
            config.poll_interval,
            config.poll_backoff,
        ))
    }

    pub fn bindings(&self) -> &HotkeyBindings {
        &self.bindings
    }

    /// Sample both chords once and advance `state`.
    ///
    /// A failed query counts as "nothing held": the edge state is reset and
    /// the error is returned so the caller can back off.
    pub fn poll_once(&self, state: &mut HotkeyEdgeState) -> Result<Vec<SessionCommand>> {
        match self.levels() {
            Ok((start_down, stop_down)) => Ok(state.observe(start_down, stop_down)),
            Err(e) => {
                state.observe(false, false);
                Err(e)
            }
        }
    }

    fn levels(&self) -> Result<(bool, bool)> {
        Ok((
            self.chord_down(&self.bindings.start)?,
            self.chord_down(&self.bindings.stop)?,
        ))
    }

    fn chord_down(&self, chord: &Chord) -> Result<bool> {
        let keys: Vec<Key> = chord.keys().collect();
        self.backend.all_down(&keys)
    }

    /// Poll until `shutdown` is set, passing every fired command to `on_command`.
    pub fn run<F>(&self, shutdown: &AtomicBool, mut on_command: F)
    where
        F: FnMut(SessionCommand),
    {
        let mut state = HotkeyEdgeState::default();
        info!(
            start = %self.bindings.start,
            stop = %self.bindings.stop,
            "hotkey poller started"
        );

        while !shutdown.load(Ordering::Acquire) {
            match self.poll_once(&mut state) {
                Ok(fired) => {
                    for command in fired {
                        debug!(?command, "hotkey fired");
                        on_command(command);
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    debug!(error = %e, "key state query failed, backing off");
                    thread::sleep(self.backoff);
                }
            }
        }

        info!("hotkey poller stopped");
    }

    /// Run the poller on its own below-normal-priority thread.
    pub fn spawn<F>(self, shutdown: Arc<AtomicBool>, on_command: F) -> io::Result<JoinHandle<()>>
    where
        F: FnMut(SessionCommand) + Send + 'static,
    {
        thread::Builder::new()
            .name("hotkey-poller".to_string())
            .spawn(move || {
                if let Err(e) = priority::set_current_thread_priority(ThreadPriority::BelowNormal) {
                    debug!(error = %e, "running hotkey poller at default priority");
                }
                self.run(&shutdown, on_command);
            })
    }
}
