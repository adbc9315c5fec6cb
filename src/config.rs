//! JSON configuration file and the typed views the engine consumes.

use crate::error::{ClickerError, Result};
use crate::keys::Chord;
use crate::scheduler::PacingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Highest accepted clicks-per-second.
pub const MAX_CLICKS_PER_SECOND: u32 = 1000;

/// Validated click rate handed to a session when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickConfig {
    clicks_per_second: u32,
}

impl ClickConfig {
    pub fn new(clicks_per_second: u32) -> Result<Self> {
        if clicks_per_second == 0 {
            return Err(ClickerError::invalid_rate(
                clicks_per_second,
                "must be at least 1 click per second",
            ));
        }
        if clicks_per_second > MAX_CLICKS_PER_SECOND {
            return Err(ClickerError::invalid_rate(
                clicks_per_second,
                format!("must not exceed {MAX_CLICKS_PER_SECOND} clicks per second"),
            ));
        }
        Ok(Self { clicks_per_second })
    }

    pub fn clicks_per_second(&self) -> u32 {
        self.clicks_per_second
    }

    /// Time between successive clicks.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.clicks_per_second))
    }
}

/// The two chords the hotkey poller watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub start: Chord,
    pub stop: Chord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "clicksPerSecond")]
    pub clicks_per_second: u32,
    pub start_hotkey: String,
    pub stop_hotkey: String,
    pub hotkeys_enabled: bool,
    #[serde(with = "duration_str")]
    pub poll_interval: Duration,
    #[serde(with = "duration_str")]
    pub poll_backoff: Duration,
    #[serde(with = "duration_str")]
    pub stop_timeout: Duration,
    pub spin_batch: u32,
    pub press_release_spins: u32,
    #[serde(with = "option_duration_str")]
    pub sleep_margin: Option<Duration>,
    #[serde(with = "duration_str")]
    pub sleep_slice: Duration,
    pub max_consecutive_failures: u32,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        let pacing = PacingConfig::default();
        Self {
            clicks_per_second: 10,
            start_hotkey: "ctrl+f1".to_string(),
            stop_hotkey: "ctrl+f2".to_string(),
            hotkeys_enabled: true,
            poll_interval: Duration::from_millis(50),
            poll_backoff: Duration::from_millis(100),
            stop_timeout: Duration::from_secs(1),
            spin_batch: pacing.spin_batch,
            press_release_spins: pacing.press_release_spins,
            sleep_margin: pacing.sleep_margin,
            sleep_slice: pacing.sleep_slice,
            max_consecutive_failures: pacing.max_consecutive_failures,
            verbose: false,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ClickerError::config_load(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| ClickerError::config_load(path.display().to_string(), e.to_string()))
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| ClickerError::config_save(path.display().to_string(), e.to_string()))
    }

    /// Load `path`, or write the defaults there if it does not exist yet.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        let config = Self::default();
        config.save_to_file(path)?;
        info!(path = %path.display(), "wrote default configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.click_config()
            .map_err(|e| ClickerError::config_validation(e.to_string()))?;

        let bindings = self.hotkey_bindings()?;
        if bindings.start == bindings.stop {
            return Err(ClickerError::config_validation(
                "start_hotkey and stop_hotkey must differ",
            ));
        }

        if self.poll_interval.is_zero() || self.poll_interval > Duration::from_secs(1) {
            return Err(ClickerError::config_validation(
                "poll_interval must be between 1ms and 1s",
            ));
        }
        if self.poll_backoff.is_zero() {
            return Err(ClickerError::config_validation(
                "poll_backoff must be positive",
            ));
        }
        if self.stop_timeout.is_zero() {
            return Err(ClickerError::config_validation(
                "stop_timeout must be positive",
            ));
        }
        if self.spin_batch == 0 {
            return Err(ClickerError::config_validation(
                "spin_batch must be at least 1",
            ));
        }
        if self.sleep_margin.is_some() && self.sleep_slice.is_zero() {
            return Err(ClickerError::config_validation(
                "sleep_slice must be positive when sleep_margin is set",
            ));
        }

        Ok(())
    }

    pub fn click_config(&self) -> Result<ClickConfig> {
        ClickConfig::new(self.clicks_per_second)
    }

    pub fn pacing(&self) -> PacingConfig {
        PacingConfig {
            spin_batch: self.spin_batch.max(1),
            press_release_spins: self.press_release_spins,
            sleep_margin: self.sleep_margin,
            sleep_slice: self.sleep_slice,
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }

    pub fn hotkey_bindings(&self) -> Result<HotkeyBindings> {
        Ok(HotkeyBindings {
            start: self.start_hotkey.parse()?,
            stop: self.stop_hotkey.parse()?,
        })
    }
}

/// Parse a duration such as `500ms`, `2s`, `1m` or `250us`.
///
/// A bare number is taken as milliseconds. Case and surrounding whitespace
/// are ignored.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let value = s.trim().to_lowercase();
    if value.is_empty() {
        return Err(ClickerError::invalid_duration(s, "empty duration"));
    }

    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    if number.is_empty() {
        return Err(ClickerError::invalid_duration(s, "missing number"));
    }
    let amount: u64 = number
        .parse()
        .map_err(|_| ClickerError::invalid_duration(s, "number out of range"))?;

    let duration = match unit.trim() {
        "" | "ms" => Duration::from_millis(amount),
        "us" => Duration::from_micros(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        other => {
            return Err(ClickerError::invalid_duration(
                s,
                format!("unknown unit '{other}' (use us, ms, s or m)"),
            ))
        }
    };
    Ok(duration)
}

fn format_duration(duration: &Duration) -> String {
    if duration.subsec_nanos() % 1_000_000 != 0 {
        format!("{}us", duration.as_micros())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

mod option_duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_some(&super::format_duration(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| super::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
