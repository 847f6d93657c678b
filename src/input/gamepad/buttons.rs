//! Button mapping for gilrs controllers
//!
//! D-pad buttons become direction keys; every other button is passed through
//! as [`Key::Other`] carrying the gilrs button number, which the session does
//! not handle.

use gilrs::Button;

use crate::heading::{DeviceId, Direction};
use crate::session::{InputEvent, Key};

/// Kind of button transition reported by gilrs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTransition {
    Pressed,
    /// Auto-repeat while held
    Repeated,
    Released,
}

/// Map gilrs D-Pad button to direction
///
/// Returns `None` for non-D-Pad buttons.
pub fn gilrs_dpad_to_direction(button: Button) -> Option<Direction> {
    match button {
        Button::DPadUp => Some(Direction::Up),
        Button::DPadDown => Some(Direction::Down),
        Button::DPadLeft => Some(Direction::Left),
        Button::DPadRight => Some(Direction::Right),
        _ => None,
    }
}

/// Convert gilrs button to a session key
pub fn gilrs_button_to_key(button: Button) -> Key {
    match gilrs_dpad_to_direction(button) {
        Some(direction) => Key::Dpad(direction),
        None => Key::Other(button as u32),
    }
}

/// Build the key event for a button transition
pub fn key_event(device: DeviceId, button: Button, transition: ButtonTransition) -> InputEvent {
    let key = gilrs_button_to_key(button);
    match transition {
        ButtonTransition::Pressed => InputEvent::KeyDown {
            device,
            key,
            repeat_count: 0,
        },
        ButtonTransition::Repeated => InputEvent::KeyDown {
            device,
            key,
            repeat_count: 1,
        },
        ButtonTransition::Released => InputEvent::KeyUp { device, key },
    }
}
