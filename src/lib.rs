//! # Rapid Clicker
//!
//! A command-line tool that clicks the left mouse button at a fixed rate and
//! position, controlled from the console or by global hotkeys.
//!
//! ## Features
//!
//! - Drift-free cadence: deadlines advance by a fixed period
//! - Busy-wait pacing with an optional coarse-sleep phase for slow rates
//! - Clicker thread at elevated priority, hotkey poller below normal
//! - Edge-triggered hotkey chords over a polled key-state API
//! - Automatic stop after a streak of failed injections
//! - JSON configuration file support
//! - Windows backend, portable X11/macOS backend behind the `portable` feature
//!
//! ## Example
//!
//! ```no_run
//! use rapid_clicker::{ClickConfig, DryRunBackend, PacingConfig, SessionController};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let backend = Arc::new(DryRunBackend::new());
//! let controller = SessionController::new(
//!     backend.clone(),
//!     ClickConfig::new(20).unwrap(),
//!     PacingConfig::default(),
//!     Duration::from_secs(1),
//! );
//!
//! controller.start().unwrap();
//! std::thread::sleep(Duration::from_millis(500));
//! controller.stop();
//! println!("clicked {} times", backend.releases());
//! ```
//!
//! ## Configuration
//!
//! Configuration is read from a JSON file; every field is optional:
//!
//! ```json
//! {
//!   "clicks_per_second": 25,
//!   "start_hotkey": "ctrl+f1",
//!   "stop_hotkey": "ctrl+f2",
//!   "poll_interval": "50ms"
//! }
//! ```

pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod hotkey;
pub mod keys;
pub mod platform;
pub mod priority;
pub mod scheduler;
pub mod session;
pub mod template;

pub use config::{ClickConfig, Config};
pub use error::{ClickerError, Result};
pub use hotkey::HotkeyPoller;
pub use keys::{Chord, Key};
pub use platform::{DryRunBackend, InputBackend, Point};
pub use scheduler::{ClickLoop, LoopReport, PacingConfig};
pub use session::{SessionCommand, SessionController, StartOutcome, StopOutcome};
