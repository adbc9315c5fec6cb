//! OS input boundary.
//!
//! Everything the engine needs from the operating system goes through
//! [`InputBackend`]: a non-blocking key-state query, cursor get/set, and
//! synthetic left-button injection. The core never calls OS APIs directly.

use crate::error::Result;
use crate::keys::Key;
use std::fmt;
use std::sync::Arc;

pub mod dry_run;
#[cfg(all(not(windows), feature = "portable"))]
pub mod portable;
#[cfg(windows)]
pub mod windows;

pub use dry_run::DryRunBackend;

/// Screen coordinate in physical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Half of a left click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
    Release,
}

/// Capability interface over the platform's input primitives.
///
/// Implementations must be callable from the clicker thread, the hotkey
/// poller and the console at the same time.
pub trait InputBackend: Send + Sync {
    /// Whether `key` is held down right now. Must not block.
    fn key_down(&self, key: Key) -> Result<bool>;

    /// Whether every key in `keys` is held down right now.
    fn all_down(&self, keys: &[Key]) -> Result<bool> {
        for &key in keys {
            if !self.key_down(key)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn cursor_position(&self) -> Result<Point>;

    fn set_cursor_position(&self, point: Point) -> Result<()>;

    /// Inject one left-button transition at the current cursor position.
    fn inject(&self, event: ButtonEvent) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// The input backend for the platform this binary was built for.
#[cfg(windows)]
pub fn native_backend() -> Result<Arc<dyn InputBackend>> {
    Ok(Arc::new(windows::WindowsBackend::new()))
}

/// The input backend for the platform this binary was built for.
#[cfg(all(not(windows), feature = "portable"))]
pub fn native_backend() -> Result<Arc<dyn InputBackend>> {
    Ok(Arc::new(portable::PortableBackend::new()?))
}

/// The input backend for the platform this binary was built for.
#[cfg(all(not(windows), not(feature = "portable")))]
pub fn native_backend() -> Result<Arc<dyn InputBackend>> {
    Err(crate::error::ClickerError::unsupported_platform(
        "no native input backend compiled in; rebuild with `--features portable` or run with --dry-run",
    ))
}
