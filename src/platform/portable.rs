//! Backend for non-Windows desktops: `device_query` for key state and
//! `enigo` for cursor control and button injection.

use super::{ButtonEvent, InputBackend, Point};
use crate::error::{ClickerError, Result};
use crate::keys::Key;
use crate::template::EventTemplate;
use device_query::{DeviceQuery, DeviceState, Keycode};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use parking_lot::Mutex;

pub struct PortableBackend {
    enigo: Mutex<Enigo>,
    template: EventTemplate<Direction>,
}

impl PortableBackend {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ClickerError::unsupported_platform(format!("enigo: {e}")))?;
        Ok(Self {
            enigo: Mutex::new(enigo),
            template: EventTemplate::build(|event| match event {
                ButtonEvent::Press => Direction::Press,
                ButtonEvent::Release => Direction::Release,
            }),
        })
    }
}

fn keycodes(key: Key) -> &'static [Keycode] {
    match key {
        Key::Control => &[Keycode::LControl, Keycode::RControl],
        Key::Shift => &[Keycode::LShift, Keycode::RShift],
        Key::Alt => &[Keycode::LAlt, Keycode::RAlt],
        Key::Meta => &[Keycode::Meta],
        Key::Function(1) => &[Keycode::F1],
        Key::Function(2) => &[Keycode::F2],
        Key::Function(3) => &[Keycode::F3],
        Key::Function(4) => &[Keycode::F4],
        Key::Function(5) => &[Keycode::F5],
        Key::Function(6) => &[Keycode::F6],
        Key::Function(7) => &[Keycode::F7],
        Key::Function(8) => &[Keycode::F8],
        Key::Function(9) => &[Keycode::F9],
        Key::Function(10) => &[Keycode::F10],
        Key::Function(11) => &[Keycode::F11],
        Key::Function(12) => &[Keycode::F12],
        Key::Function(_) => &[],
        Key::Letter(c) => letter(c),
        Key::Digit(d) => digit(d),
        Key::Space => &[Keycode::Space],
        Key::Enter => &[Keycode::Enter],
        Key::Tab => &[Keycode::Tab],
        Key::Escape => &[Keycode::Escape],
        Key::Backspace => &[Keycode::Backspace],
        Key::Delete => &[Keycode::Delete],
        Key::Insert => &[Keycode::Insert],
        Key::Home => &[Keycode::Home],
        Key::End => &[Keycode::End],
        Key::PageUp => &[Keycode::PageUp],
        Key::PageDown => &[Keycode::PageDown],
        Key::Up => &[Keycode::Up],
        Key::Down => &[Keycode::Down],
        Key::Left => &[Keycode::Left],
        Key::Right => &[Keycode::Right],
    }
}

fn letter(c: char) -> &'static [Keycode] {
    static LETTERS: [Keycode; 26] = [
        Keycode::A,
        Keycode::B,
        Keycode::C,
        Keycode::D,
        Keycode::E,
        Keycode::F,
        Keycode::G,
        Keycode::H,
        Keycode::I,
        Keycode::J,
        Keycode::K,
        Keycode::L,
        Keycode::M,
        Keycode::N,
        Keycode::O,
        Keycode::P,
        Keycode::Q,
        Keycode::R,
        Keycode::S,
        Keycode::T,
        Keycode::U,
        Keycode::V,
        Keycode::W,
        Keycode::X,
        Keycode::Y,
        Keycode::Z,
    ];
    match c {
        'A'..='Z' => {
            let i = (c as u8 - b'A') as usize;
            &LETTERS[i..=i]
        }
        _ => &[],
    }
}

fn digit(d: u8) -> &'static [Keycode] {
    static DIGITS: [Keycode; 10] = [
        Keycode::Key0,
        Keycode::Key1,
        Keycode::Key2,
        Keycode::Key3,
        Keycode::Key4,
        Keycode::Key5,
        Keycode::Key6,
        Keycode::Key7,
        Keycode::Key8,
        Keycode::Key9,
    ];
    let i = d as usize;
    DIGITS.get(i..=i).unwrap_or(&[])
}

/// Snapshot of held keys. `DeviceState::new` panics without a display.
fn pressed_keys(querying: impl ToString) -> Result<Vec<Keycode>> {
    DeviceState::checked_new()
        .map(|state| state.get_keys())
        .ok_or_else(|| ClickerError::key_query(querying, "no display"))
}

fn held(key: Key, pressed: &[Keycode]) -> bool {
    keycodes(key).iter().any(|code| pressed.contains(code))
}

impl InputBackend for PortableBackend {
    fn key_down(&self, key: Key) -> Result<bool> {
        if keycodes(key).is_empty() {
            return Ok(false);
        }
        Ok(held(key, &pressed_keys(key)?))
    }

    fn all_down(&self, keys: &[Key]) -> Result<bool> {
        let Some(&first) = keys.first() else {
            return Ok(true);
        };
        let pressed = pressed_keys(first)?;
        Ok(keys.iter().all(|&key| held(key, &pressed)))
    }

    fn cursor_position(&self) -> Result<Point> {
        let (x, y) = self.enigo.lock().location().map_err(ClickerError::cursor)?;
        Ok(Point::new(x, y))
    }

    fn set_cursor_position(&self, point: Point) -> Result<()> {
        self.enigo
            .lock()
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(ClickerError::cursor)
    }

    fn inject(&self, event: ButtonEvent) -> Result<()> {
        let direction = *self.template.get(event);
        self.enigo
            .lock()
            .button(Button::Left, direction)
            .map_err(ClickerError::injection)
    }

    fn name(&self) -> &'static str {
        "portable"
    }
}
