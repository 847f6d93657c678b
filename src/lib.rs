//! UDP Joystick - steer a remote device from a gamepad over UDP
//!
//! Gamepad input (D-pad keys and analog axes) is reduced to a heading angle
//! per device, and every input step broadcasts each device's heading as a
//! fixed-width `LA:xxx LS:yyy ;` datagram.

pub mod config;
pub mod heading;
pub mod input;
pub mod registry;
pub mod session;
pub mod transport;

pub use heading::{DeviceHeadingState, DeviceId, Direction};
pub use registry::DeviceRegistry;
pub use session::{InputEvent, JoystickSession, Key};
pub use transport::HeadingSink;
