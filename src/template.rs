//! Prebuilt press/release descriptors.

use crate::platform::ButtonEvent;

/// The two low-level event payloads a backend hands to its injection call.
///
/// Built once when the backend is created and only read afterwards, so the
/// clicker loop never constructs an event on the hot path.
#[derive(Debug, Clone, Copy)]
pub struct EventTemplate<E> {
    press: E,
    release: E,
}

impl<E> EventTemplate<E> {
    /// Build both descriptors from a constructor that receives the event kind.
    pub fn build(mut make: impl FnMut(ButtonEvent) -> E) -> Self {
        Self {
            press: make(ButtonEvent::Press),
            release: make(ButtonEvent::Release),
        }
    }

    pub fn get(&self, event: ButtonEvent) -> &E {
        match event {
            ButtonEvent::Press => &self.press,
            ButtonEvent::Release => &self.release,
        }
    }
}
