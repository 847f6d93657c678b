//! Input sources feeding the joystick session

pub mod gamepad;

pub use gamepad::GamepadProvider;
