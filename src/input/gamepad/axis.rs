//! Axis mapping from gilrs axes to heading axes
//!
//! gilrs reports sticks with Y pointing up; heading Y points down, so every
//! vertical axis is negated on the way in.

use gilrs::{Axis, Gamepad};

use crate::heading::axes::{AxisId, AxisRanges, AxisSample, MotionEvent};

/// gilrs axis, heading axis, sign
const AXIS_MAP: [(Axis, AxisId, f32); 6] = [
    (Axis::LeftStickX, AxisId::X, 1.0),
    (Axis::LeftStickY, AxisId::Y, -1.0),
    (Axis::DPadX, AxisId::HatX, 1.0),
    (Axis::DPadY, AxisId::HatY, -1.0),
    (Axis::RightStickX, AxisId::Z, 1.0),
    (Axis::RightStickY, AxisId::Rz, -1.0),
];

/// Heading axis and sign for a gilrs axis, `None` if not used for steering
pub fn gilrs_axis_to_axis_id(axis: Axis) -> Option<(AxisId, f32)> {
    AXIS_MAP
        .iter()
        .find(|(gilrs_axis, _, _)| *gilrs_axis == axis)
        .map(|(_, id, sign)| (*id, *sign))
}

/// Build a sample from raw gilrs axis values
pub fn sample_from_values(mut value_of: impl FnMut(Axis) -> f32) -> AxisSample {
    let mut sample = AxisSample::new();
    for (axis, id, sign) in AXIS_MAP {
        sample.set(id, value_of(axis) * sign);
    }
    sample
}

/// Build ranges from per-axis gilrs deadzones
///
/// Axes the gamepad does not expose, or exposes without a deadzone, get
/// `default_flat`.
pub fn ranges_from_deadzones(
    mut deadzone_of: impl FnMut(Axis) -> Option<f32>,
    default_flat: f32,
) -> AxisRanges {
    let mut ranges = AxisRanges::new();
    for (axis, id, _) in AXIS_MAP {
        ranges.set_flat(id, deadzone_of(axis).unwrap_or(default_flat));
    }
    ranges
}

/// Current axis values of a gamepad, from gilrs cached state
pub fn snapshot(gamepad: &Gamepad<'_>) -> AxisSample {
    sample_from_values(|axis| gamepad.value(axis))
}

/// Flat widths reported by a gamepad
pub fn ranges_for(gamepad: &Gamepad<'_>, default_flat: f32) -> AxisRanges {
    ranges_from_deadzones(
        |axis| gamepad.axis_code(axis).and_then(|code| gamepad.deadzone(code)),
        default_flat,
    )
}

/// Motion event for the gamepad's current state
pub fn motion_event(gamepad: &Gamepad<'_>, default_flat: f32) -> MotionEvent {
    MotionEvent::new(snapshot(gamepad), ranges_for(gamepad, default_flat))
}
