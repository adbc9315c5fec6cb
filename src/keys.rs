//! Key identifiers and hotkey chord parsing.
//!
//! Chords are written the same way everywhere (config file, banner, logs):
//! modifiers and a single trigger key joined by `+`, e.g. `ctrl+f1`.

use crate::error::{ClickerError, Result};
use std::fmt;
use std::str::FromStr;

/// A key whose pressed state can be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Control,
    Shift,
    Alt,
    Meta,
    /// Function key `F1`..=`F12`.
    Function(u8),
    /// Uppercase ASCII letter.
    Letter(char),
    /// Digit `0`..=`9` on the main row.
    Digit(u8),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub fn is_modifier(self) -> bool {
        matches!(self, Key::Control | Key::Shift | Key::Alt | Key::Meta)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Control => f.write_str("ctrl"),
            Key::Shift => f.write_str("shift"),
            Key::Alt => f.write_str("alt"),
            Key::Meta => f.write_str("meta"),
            Key::Function(n) => write!(f, "f{n}"),
            Key::Letter(c) => write!(f, "{}", c.to_ascii_lowercase()),
            Key::Digit(d) => write!(f, "{d}"),
            Key::Space => f.write_str("space"),
            Key::Enter => f.write_str("enter"),
            Key::Tab => f.write_str("tab"),
            Key::Escape => f.write_str("escape"),
            Key::Backspace => f.write_str("backspace"),
            Key::Delete => f.write_str("delete"),
            Key::Insert => f.write_str("insert"),
            Key::Home => f.write_str("home"),
            Key::End => f.write_str("end"),
            Key::PageUp => f.write_str("pageup"),
            Key::PageDown => f.write_str("pagedown"),
            Key::Up => f.write_str("up"),
            Key::Down => f.write_str("down"),
            Key::Left => f.write_str("left"),
            Key::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Key {
    type Err = ClickerError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();

        let key = match name.as_str() {
            "ctrl" | "control" => Key::Control,
            "shift" => Key::Shift,
            "alt" => Key::Alt,
            "meta" | "cmd" | "super" | "win" => Key::Meta,

            "space" => Key::Space,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "backspace" => Key::Backspace,
            "delete" => Key::Delete,
            "insert" => Key::Insert,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,

            "up" | "arrowup" => Key::Up,
            "down" | "arrowdown" => Key::Down,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,

            other => parse_single(other).ok_or_else(|| {
                ClickerError::invalid_hotkey(s, format!("unsupported key '{other}'"))
            })?,
        };

        Ok(key)
    }
}

fn parse_single(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(Key::Letter(c.to_ascii_uppercase())),
        (Some(c), None) if c.is_ascii_digit() => Some(Key::Digit(c as u8 - b'0')),
        (Some('f'), Some(_)) => match name[1..].parse::<u8>() {
            Ok(n @ 1..=12) => Some(Key::Function(n)),
            _ => None,
        },
        _ => None,
    }
}

/// Zero or more modifiers held together with one trigger key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    modifiers: Vec<Key>,
    trigger: Key,
}

impl Chord {
    pub fn new(modifiers: Vec<Key>, trigger: Key) -> Self {
        Self { modifiers, trigger }
    }

    pub fn modifiers(&self) -> &[Key] {
        &self.modifiers
    }

    pub fn trigger(&self) -> Key {
        self.trigger
    }

    /// Every key that must be down for the chord to be held.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.modifiers.iter().copied().chain(std::iter::once(self.trigger))
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{modifier}+")?;
        }
        write!(f, "{}", self.trigger)
    }
}

impl FromStr for Chord {
    type Err = ClickerError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();

        if parts.iter().all(|p| p.is_empty()) {
            return Err(ClickerError::invalid_hotkey(s, "empty hotkey string"));
        }

        let mut modifiers = Vec::new();
        let mut trigger = None;

        for part in parts {
            if part.is_empty() {
                return Err(ClickerError::invalid_hotkey(s, "empty key between '+'"));
            }
            let key: Key = part.parse()?;
            if key.is_modifier() && trigger.is_none() {
                if !modifiers.contains(&key) {
                    modifiers.push(key);
                }
                continue;
            }
            if trigger.is_some() {
                return Err(ClickerError::invalid_hotkey(s, "multiple keys specified"));
            }
            trigger = Some(key);
        }

        let trigger = trigger.ok_or_else(|| ClickerError::invalid_hotkey(s, "no key specified"))?;
        Ok(Chord { modifiers, trigger })
    }
}
