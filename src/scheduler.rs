//! The clicker loop: fixed-cadence press/release emission.
//!
//! Deadlines advance by exactly one period per emission and are never
//! re-derived from "now", so processing overhead does not accumulate into
//! drift. Waiting is a busy-wait (optionally preceded by coarse sleeps for
//! long periods) that re-checks the active flag on every iteration.

use crate::clock::Clock;
use crate::error::Result;
use crate::platform::{ButtonEvent, InputBackend, Point};
use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tunables for how the loop waits between emissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// `spin_loop` hints per busy-wait iteration.
    pub spin_batch: u32,
    /// `spin_loop` hints between press and release.
    pub press_release_spins: u32,
    /// Sleep while more than this remains before a deadline; `None` spins only.
    pub sleep_margin: Option<Duration>,
    /// Longest single sleep, bounding how long a stop request can go unseen.
    pub sleep_slice: Duration,
    /// Consecutive failed clicks before the loop stops itself; 0 never trips.
    pub max_consecutive_failures: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            spin_batch: 1,
            press_release_spins: 50,
            sleep_margin: Some(Duration::from_millis(20)),
            sleep_slice: Duration::from_millis(5),
            max_consecutive_failures: 100,
        }
    }
}

/// What a finished loop did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Press/release pairs delivered.
    pub pairs: u64,
    /// Clicks whose injection failed.
    pub failures: u64,
    /// The loop stopped itself after too many consecutive failures.
    pub tripped: bool,
}

pub struct ClickLoop<C: Clock> {
    backend: Arc<dyn InputBackend>,
    clock: C,
    period: Duration,
    anchor: Point,
    pacing: PacingConfig,
}

impl<C: Clock> ClickLoop<C> {
    pub fn new(
        backend: Arc<dyn InputBackend>,
        clock: C,
        period: Duration,
        anchor: Point,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            period,
            anchor,
            pacing,
        }
    }

    /// Click until `active` is cleared (by the controller, or by the loop's
    /// own circuit breaker).
    pub fn run(&self, active: &AtomicBool) -> LoopReport {
        let mut report = LoopReport::default();
        let mut consecutive_failures = 0u32;

        if let Err(e) = self.backend.set_cursor_position(self.anchor) {
            warn!(error = %e, anchor = %self.anchor, "could not move cursor to anchor");
        }

        info!(period = ?self.period, anchor = %self.anchor, "clicker loop started");
        let mut deadline = self.clock.now() + self.period;

        while active.load(Ordering::Acquire) {
            if !self.wait_until(deadline, active) {
                break;
            }
            if !active.load(Ordering::Acquire) {
                break;
            }

            match self.click() {
                Ok(()) => {
                    report.pairs += 1;
                    consecutive_failures = 0;
                }
                Err(e) => {
                    report.failures += 1;
                    consecutive_failures += 1;
                    if consecutive_failures == 1 {
                        warn!(error = %e, "click injection failed");
                    } else {
                        debug!(error = %e, consecutive_failures, "click injection failed again");
                    }

                    let limit = self.pacing.max_consecutive_failures;
                    if limit > 0 && consecutive_failures >= limit {
                        error!(
                            consecutive_failures,
                            "too many failed clicks in a row, stopping session"
                        );
                        active.store(false, Ordering::Release);
                        report.tripped = true;
                        break;
                    }
                }
            }

            deadline += self.period;
        }

        info!(
            pairs = report.pairs,
            failures = report.failures,
            tripped = report.tripped,
            "clicker loop finished"
        );
        report
    }

    /// Returns `false` if `active` cleared before the deadline.
    fn wait_until(&self, deadline: Duration, active: &AtomicBool) -> bool {
        loop {
            if !active.load(Ordering::Acquire) {
                return false;
            }
            let now = self.clock.now();
            if now >= deadline {
                return true;
            }

            let remaining = deadline - now;
            match self.pacing.sleep_margin {
                Some(margin) if remaining > margin => {
                    self.clock
                        .sleep((remaining - margin).min(self.pacing.sleep_slice));
                }
                _ => spin(self.pacing.spin_batch),
            }
        }
    }

    fn click(&self) -> Result<()> {
        self.backend.inject(ButtonEvent::Press)?;
        spin(self.pacing.press_release_spins);
        self.backend.inject(ButtonEvent::Release)
    }
}

fn spin(iterations: u32) {
    for _ in 0..iterations {
        hint::spin_loop();
    }
}
