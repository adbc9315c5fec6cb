//! In-memory backend used by `--dry-run` and the test suite.

use super::{ButtonEvent, InputBackend, Point};
use crate::error::{ClickerError, Result};
use crate::keys::Key;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Backend that simulates the OS instead of touching it.
///
/// Key state is scripted with [`press_key`](Self::press_key) /
/// [`release_key`](Self::release_key), injected events are counted, and
/// failures can be switched on to exercise recovery paths.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    cursor: Mutex<Point>,
    held: Mutex<HashSet<Key>>,
    log: Option<Mutex<Vec<ButtonEvent>>>,
    presses: AtomicU64,
    releases: AtomicU64,
    cursor_moves: AtomicU64,
    fail_injection: AtomicBool,
    fail_key_queries: AtomicBool,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`new`](Self::new) but also keeps every injected event in order.
    pub fn recording() -> Self {
        Self {
            log: Some(Mutex::new(Vec::new())),
            ..Self::default()
        }
    }

    /// Move the simulated cursor as a user would (not counted as a snap).
    pub fn set_cursor(&self, point: Point) {
        *self.cursor.lock() = point;
    }

    pub fn press_key(&self, key: Key) {
        self.held.lock().insert(key);
    }

    pub fn release_key(&self, key: Key) {
        self.held.lock().remove(&key);
    }

    pub fn set_fail_injection(&self, fail: bool) {
        self.fail_injection.store(fail, Ordering::Release);
    }

    pub fn set_fail_key_queries(&self, fail: bool) {
        self.fail_key_queries.store(fail, Ordering::Release);
    }

    pub fn presses(&self) -> u64 {
        self.presses.load(Ordering::Acquire)
    }

    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Acquire)
    }

    /// Number of times the engine repositioned the cursor.
    pub fn cursor_moves(&self) -> u64 {
        self.cursor_moves.load(Ordering::Acquire)
    }

    /// Recorded events; empty unless built with [`recording`](Self::recording).
    pub fn events(&self) -> Vec<ButtonEvent> {
        self.log
            .as_ref()
            .map(|log| log.lock().clone())
            .unwrap_or_default()
    }
}

impl InputBackend for DryRunBackend {
    fn key_down(&self, key: Key) -> Result<bool> {
        if self.fail_key_queries.load(Ordering::Acquire) {
            return Err(ClickerError::key_query(key, "simulated query failure"));
        }
        Ok(self.held.lock().contains(&key))
    }

    fn cursor_position(&self) -> Result<Point> {
        Ok(*self.cursor.lock())
    }

    fn set_cursor_position(&self, point: Point) -> Result<()> {
        *self.cursor.lock() = point;
        self.cursor_moves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn inject(&self, event: ButtonEvent) -> Result<()> {
        if self.fail_injection.load(Ordering::Acquire) {
            return Err(ClickerError::injection("simulated injection failure"));
        }
        if let Some(log) = &self.log {
            log.lock().push(event);
        }
        let counter = match event {
            ButtonEvent::Press => &self.presses,
            ButtonEvent::Release => &self.releases,
        };
        counter.fetch_add(1, Ordering::AcqRel);
        trace!(?event, "dry-run injection");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
