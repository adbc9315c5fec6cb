//! Win32 backend built on `SendInput` and `GetAsyncKeyState`.

use super::{ButtonEvent, InputBackend, Point};
use crate::error::{ClickerError, Result};
use crate::keys::Key;
use crate::template::EventTemplate;
use std::io;
use std::mem;
use winapi::ctypes::c_int;
use winapi::shared::minwindef::DWORD;
use winapi::shared::windef::POINT;
use winapi::um::winuser::{
    GetAsyncKeyState, GetCursorPos, SendInput, SetCursorPos, INPUT, INPUT_MOUSE,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, VK_BACK, VK_CONTROL, VK_DELETE, VK_DOWN, VK_END,
    VK_ESCAPE, VK_F1, VK_HOME, VK_INSERT, VK_LEFT, VK_LWIN, VK_MENU, VK_NEXT, VK_PRIOR,
    VK_RETURN, VK_RIGHT, VK_SHIFT, VK_SPACE, VK_TAB, VK_UP,
};

/// High bit of `GetAsyncKeyState`: key is currently down.
const KEY_DOWN_MASK: u16 = 0x8000;

pub struct WindowsBackend {
    template: EventTemplate<INPUT>,
}

impl WindowsBackend {
    pub fn new() -> Self {
        Self {
            template: EventTemplate::build(|event| match event {
                ButtonEvent::Press => mouse_input(MOUSEEVENTF_LEFTDOWN),
                ButtonEvent::Release => mouse_input(MOUSEEVENTF_LEFTUP),
            }),
        }
    }
}

impl Default for WindowsBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Mouse `INPUT` with zero deltas, so it acts at the current cursor position.
fn mouse_input(flags: DWORD) -> INPUT {
    // SAFETY: INPUT is plain old data; all-zero is a valid value.
    let mut input: INPUT = unsafe { mem::zeroed() };
    input.type_ = INPUT_MOUSE;
    // SAFETY: type_ is INPUT_MOUSE, so `mi` is the active union member.
    let mi = unsafe { input.u.mi_mut() };
    mi.dwFlags = flags;
    input
}

fn virtual_key(key: Key) -> c_int {
    match key {
        Key::Control => VK_CONTROL,
        Key::Shift => VK_SHIFT,
        Key::Alt => VK_MENU,
        Key::Meta => VK_LWIN,
        Key::Function(n) => VK_F1 + c_int::from(n) - 1,
        Key::Letter(c) => c as c_int,
        Key::Digit(d) => c_int::from(b'0' + d),
        Key::Space => VK_SPACE,
        Key::Enter => VK_RETURN,
        Key::Tab => VK_TAB,
        Key::Escape => VK_ESCAPE,
        Key::Backspace => VK_BACK,
        Key::Delete => VK_DELETE,
        Key::Insert => VK_INSERT,
        Key::Home => VK_HOME,
        Key::End => VK_END,
        Key::PageUp => VK_PRIOR,
        Key::PageDown => VK_NEXT,
        Key::Up => VK_UP,
        Key::Down => VK_DOWN,
        Key::Left => VK_LEFT,
        Key::Right => VK_RIGHT,
    }
}

impl InputBackend for WindowsBackend {
    fn key_down(&self, key: Key) -> Result<bool> {
        let state = unsafe { GetAsyncKeyState(virtual_key(key)) };
        Ok(state as u16 & KEY_DOWN_MASK != 0)
    }

    fn cursor_position(&self) -> Result<Point> {
        let mut point = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut point) } == 0 {
            return Err(ClickerError::cursor(io::Error::last_os_error()));
        }
        Ok(Point::new(point.x, point.y))
    }

    fn set_cursor_position(&self, point: Point) -> Result<()> {
        if unsafe { SetCursorPos(point.x, point.y) } == 0 {
            return Err(ClickerError::cursor(io::Error::last_os_error()));
        }
        Ok(())
    }

    fn inject(&self, event: ButtonEvent) -> Result<()> {
        let mut input = *self.template.get(event);
        let sent = unsafe { SendInput(1, &mut input, mem::size_of::<INPUT>() as c_int) };
        if sent != 1 {
            return Err(ClickerError::injection(io::Error::last_os_error()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "win32"
    }
}
