//! Gamepad input support using GilRs
//!
//! Translates gilrs events into session input events, with hot-plug support.

pub mod axis;
pub mod buttons;
pub mod provider;

use gilrs::GamepadId;

use crate::heading::DeviceId;

pub use provider::GamepadProvider;

/// Session device id for a gilrs gamepad
pub fn device_id(id: GamepadId) -> DeviceId {
    DeviceId(usize::from(id) as i32)
}
