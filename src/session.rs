//! Session controller: the single owner of "are we clicking".
//!
//! Start and stop may arrive concurrently from the console and the hotkey
//! poller. Both read and write the active flag under a short internal lock,
//! so exactly one of two racing requests takes effect and the other returns
//! a no-op outcome. The lock is released before stop's bounded join.
//!
//! Every session gets a fresh flag. A worker that was detached after a stop
//! timeout keeps observing its own cleared flag and can never be revived by
//! a later start.

use crate::clock::MonotonicClock;
use crate::config::{ClickConfig, Config};
use crate::error::Result;
use crate::platform::{InputBackend, Point};
use crate::priority::{self, ThreadPriority};
use crate::scheduler::{ClickLoop, LoopReport, PacingConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often a bounded join checks whether the worker has exited.
const JOIN_POLL: Duration = Duration::from_millis(1);

/// A request to the controller, whatever its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { anchor: Point },
    /// A session was already running; nothing changed.
    AlreadyActive { anchor: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped(LoopReport),
    /// No session was running; nothing changed.
    NotActive,
    /// The worker did not exit within the stop timeout and was left to finish
    /// on its own.
    Detached,
    /// The worker had already died from a panic.
    Panicked,
}

#[derive(Default)]
struct SessionSlot {
    active: Arc<AtomicBool>,
    anchor: Option<Point>,
    worker: Option<JoinHandle<LoopReport>>,
}

impl SessionSlot {
    /// Flagged active with a worker that is still alive.
    fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }
}

pub struct SessionController {
    backend: Arc<dyn InputBackend>,
    click: ClickConfig,
    pacing: PacingConfig,
    stop_timeout: Duration,
    slot: Mutex<SessionSlot>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn InputBackend>,
        click: ClickConfig,
        pacing: PacingConfig,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            click,
            pacing,
            stop_timeout,
            slot: Mutex::new(SessionSlot::default()),
        }
    }

    pub fn from_config(backend: Arc<dyn InputBackend>, config: &Config) -> Result<Self> {
        Ok(Self::new(
            backend,
            config.click_config()?,
            config.pacing(),
            config.stop_timeout,
        ))
    }

    pub fn is_active(&self) -> bool {
        self.slot.lock().is_running()
    }

    /// Anchor of the running session, if any.
    pub fn anchor(&self) -> Option<Point> {
        let slot = self.slot.lock();
        if slot.is_running() {
            slot.anchor
        } else {
            None
        }
    }

    pub fn click_config(&self) -> ClickConfig {
        self.click
    }

    pub fn execute(&self, command: SessionCommand) -> Result<CommandOutcome> {
        match command {
            SessionCommand::Start => self.start().map(CommandOutcome::Start),
            SessionCommand::Stop => Ok(CommandOutcome::Stop(self.stop())),
        }
    }

    /// Begin clicking at the current cursor position.
    pub fn start(&self) -> Result<StartOutcome> {
        let mut slot = self.slot.lock();

        if slot.is_running() {
            let anchor = slot.anchor.unwrap_or_default();
            debug!(%anchor, "start ignored, session already active");
            return Ok(StartOutcome::AlreadyActive { anchor });
        }

        // A worker may have stopped itself through its circuit breaker, or
        // died from a panic with its flag still set.
        slot.active.store(false, Ordering::Release);
        if let Some(stale) = slot.worker.take() {
            reap(stale);
        }

        let anchor = self.backend.cursor_position()?;
        let active = Arc::new(AtomicBool::new(true));

        let backend = Arc::clone(&self.backend);
        let worker_active = Arc::clone(&active);
        let period = self.click.period();
        let pacing = self.pacing.clone();

        let spawned = thread::Builder::new()
            .name("clicker".to_string())
            .spawn(move || {
                if let Err(e) = priority::set_current_thread_priority(ThreadPriority::Highest) {
                    debug!(error = %e, "running clicker at default priority");
                }
                ClickLoop::new(backend, MonotonicClock::new(), period, anchor, pacing)
                    .run(&worker_active)
            });

        match spawned {
            Ok(handle) => {
                slot.active = active;
                slot.anchor = Some(anchor);
                slot.worker = Some(handle);
                info!(
                    %anchor,
                    clicks_per_second = self.click.clicks_per_second(),
                    "session started"
                );
                Ok(StartOutcome::Started { anchor })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stop the running session, waiting at most the stop timeout.
    pub fn stop(&self) -> StopOutcome {
        let worker = {
            let mut slot = self.slot.lock();
            if !slot.active.load(Ordering::Acquire) {
                debug!("stop ignored, no active session");
                return StopOutcome::NotActive;
            }
            slot.active.store(false, Ordering::Release);
            slot.anchor = None;
            slot.worker.take()
        };

        let outcome = match worker {
            Some(handle) => self.join_bounded(handle),
            None => StopOutcome::Stopped(LoopReport::default()),
        };
        info!(?outcome, "session stopped");
        outcome
    }

    /// Stop any session and reap any leftover worker.
    pub fn shutdown(&self) {
        if self.is_active() {
            self.stop();
        }
        let leftover = self.slot.lock().worker.take();
        if let Some(handle) = leftover {
            self.join_bounded(handle);
        }
    }

    fn join_bounded(&self, handle: JoinHandle<LoopReport>) -> StopOutcome {
        let deadline = Instant::now() + self.stop_timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    timeout = ?self.stop_timeout,
                    "clicker thread did not exit in time, detaching it"
                );
                return StopOutcome::Detached;
            }
            thread::sleep(JOIN_POLL);
        }

        match handle.join() {
            Ok(report) => StopOutcome::Stopped(report),
            Err(_) => {
                warn!("clicker thread panicked");
                StopOutcome::Panicked
            }
        }
    }
}

/// Collect a worker whose flag is already cleared without waiting for it.
fn reap(handle: JoinHandle<LoopReport>) {
    if !handle.is_finished() {
        debug!("previous clicker thread still winding down, detaching it");
        return;
    }
    match handle.join() {
        Ok(report) => debug!(?report, "reaped previous clicker thread"),
        Err(_) => warn!("previous clicker thread panicked"),
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Result of [`SessionController::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Start(StartOutcome),
    Stop(StopOutcome),
}
