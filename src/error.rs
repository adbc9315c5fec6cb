//! Custom error types for rapid-clicker.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for rapid-clicker operations.
#[derive(Error, Debug)]
pub enum ClickerError {
    /// Click rate outside the accepted range.
    #[error("invalid click rate {value}: {reason}")]
    InvalidRate { value: u32, reason: String },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// Error parsing a hotkey chord.
    #[error("invalid hotkey '{combo}': {reason}")]
    InvalidHotkey { combo: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// The OS rejected a synthetic button event.
    #[error("input injection failed: {0}")]
    Injection(String),

    /// Querying a key's pressed state failed.
    #[error("failed to query key '{key}': {reason}")]
    KeyQuery { key: String, reason: String },

    /// Reading or moving the cursor failed.
    #[error("cursor error: {0}")]
    Cursor(String),

    /// Changing a thread's scheduling priority failed.
    #[error("failed to set thread priority: {0}")]
    ThreadPriority(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for rapid-clicker operations.
pub type Result<T> = std::result::Result<T, ClickerError>;

impl ClickerError {
    /// Create a new InvalidRate error.
    pub fn invalid_rate(value: u32, reason: impl Into<String>) -> Self {
        Self::InvalidRate {
            value,
            reason: reason.into(),
        }
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidHotkey error.
    pub fn invalid_hotkey(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHotkey {
            combo: combo.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedPlatform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    /// Create a new Injection error.
    pub fn injection(message: impl ToString) -> Self {
        Self::Injection(message.to_string())
    }

    /// Create a new KeyQuery error.
    pub fn key_query(key: impl ToString, reason: impl ToString) -> Self {
        Self::KeyQuery {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new Cursor error.
    pub fn cursor(message: impl ToString) -> Self {
        Self::Cursor(message.to_string())
    }

    /// Create a new ThreadPriority error.
    pub fn thread_priority(message: impl ToString) -> Self {
        Self::ThreadPriority(message.to_string())
    }
}
