//! Per-device heading tracking
//!
//! Each connected controller owns a [`DeviceHeadingState`]. Two input paths
//! feed it:
//!
//! - **Digital** ([`DeviceHeadingState::apply_key`]): D-pad keys set one heading
//!   component to ±1 and mark the direction as held.
//! - **Analog** ([`DeviceHeadingState::apply_axes`]): stick/hat axes, resolved
//!   through the fallback chains in [`axes`]. Ignored while any D-pad
//!   direction is held.
//!
//! After either path the polar angle is recomputed, but only when the heading
//! magnitude leaves the dead zone; inside it the previous angle is kept.
//! [`DeviceHeadingState::accelerate`] turns the angle into a wire message.

pub mod axes;
pub mod wire;

use std::fmt;

use tracing::trace;

use self::axes::{resolve_heading, AxisRanges, AxisSample};
use self::wire::HeadingMessage;

/// Magnitude at or below which the heading angle is left unchanged
pub const HEADING_DEAD_ZONE: f32 = 0.1;

/// Opaque input device identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub i32);

impl DeviceId {
    /// Marker used by input sources for events not tied to a device
    pub const NONE: DeviceId = DeviceId(-1);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device:{}", self.0)
    }
}

/// D-pad direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Mask bit for this direction
    pub fn bit(self) -> DpadMask {
        match self {
            Direction::Left => DpadMask::LEFT,
            Direction::Right => DpadMask::RIGHT,
            Direction::Up => DpadMask::UP,
            Direction::Down => DpadMask::DOWN,
        }
    }

    /// Heading value while held (screen coordinates: Y grows downward)
    fn held_value(self) -> f32 {
        match self {
            Direction::Left | Direction::Up => -1.0,
            Direction::Right | Direction::Down => 1.0,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Set of currently held D-pad directions
///
/// Opposing directions may both be set; the mask only tracks what is held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DpadMask(u8);

impl DpadMask {
    pub const LEFT: DpadMask = DpadMask(1 << 0);
    pub const RIGHT: DpadMask = DpadMask(1 << 1);
    pub const UP: DpadMask = DpadMask(1 << 2);
    pub const DOWN: DpadMask = DpadMask(1 << 3);

    pub const fn empty() -> Self {
        DpadMask(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: DpadMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: DpadMask) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: DpadMask) {
        self.0 &= !other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Heading state tracked for one input device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceHeadingState {
    device_id: DeviceId,
    heading_x: f32,
    heading_y: f32,
    heading_angle: f32,
    heading_magnitude: f32,
    dpad: DpadMask,
    /// Flat widths of the device; `None` until the device announces itself
    ranges: Option<AxisRanges>,
    dead_zone: f32,
}

impl DeviceHeadingState {
    /// Fresh zeroed state using [`HEADING_DEAD_ZONE`]
    pub fn new(device_id: DeviceId) -> Self {
        Self::with_dead_zone(device_id, HEADING_DEAD_ZONE)
    }

    /// Fresh zeroed state with a custom dead zone
    pub fn with_dead_zone(device_id: DeviceId, dead_zone: f32) -> Self {
        Self {
            device_id,
            heading_x: 0.0,
            heading_y: 0.0,
            heading_angle: 0.0,
            heading_magnitude: 0.0,
            dpad: DpadMask::empty(),
            ranges: None,
            dead_zone,
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn heading_x(&self) -> f32 {
        self.heading_x
    }

    pub fn heading_y(&self) -> f32 {
        self.heading_y
    }

    /// Polar angle in radians
    pub fn heading_angle(&self) -> f32 {
        self.heading_angle
    }

    pub fn heading_magnitude(&self) -> f32 {
        self.heading_magnitude
    }

    pub fn dpad(&self) -> DpadMask {
        self.dpad
    }

    pub fn dead_zone(&self) -> f32 {
        self.dead_zone
    }

    pub fn set_dead_zone(&mut self, dead_zone: f32) {
        self.dead_zone = dead_zone;
    }

    pub fn ranges(&self) -> Option<&AxisRanges> {
        self.ranges.as_ref()
    }

    /// Replace the device's reported axis ranges
    pub fn set_ranges(&mut self, ranges: AxisRanges) {
        self.ranges = Some(ranges);
    }

    pub fn set_heading_x(&mut self, x: f32) {
        self.heading_x = clamp_unit(x);
        self.update_heading();
    }

    pub fn set_heading_y(&mut self, y: f32) {
        self.heading_y = clamp_unit(y);
        self.update_heading();
    }

    pub fn set_heading(&mut self, x: f32, y: f32) {
        self.heading_x = clamp_unit(x);
        self.heading_y = clamp_unit(y);
        self.update_heading();
    }

    /// Recompute magnitude, and the angle when outside the dead zone
    pub fn update_heading(&mut self) {
        self.heading_magnitude = (self.heading_x * self.heading_x
            + self.heading_y * self.heading_y)
            .sqrt();
        if self.heading_magnitude > self.dead_zone {
            self.heading_angle = self.heading_y.atan2(self.heading_x);
        }
    }

    /// Apply a D-pad key transition
    ///
    /// Auto-repeat key-downs (`repeat_count > 0`) are ignored. Returns whether
    /// the event was consumed.
    pub fn apply_key(&mut self, direction: Direction, is_down: bool, repeat_count: u32) -> bool {
        if is_down {
            if repeat_count != 0 {
                return false;
            }
            self.set_component(direction, direction.held_value());
            self.dpad.insert(direction.bit());
        } else {
            self.set_component(direction, 0.0);
            self.dpad.remove(direction.bit());
        }
        trace!(
            device = %self.device_id,
            ?direction,
            is_down,
            dpad = self.dpad.bits(),
            "D-pad applied"
        );
        true
    }

    /// Apply one analog sample
    ///
    /// Returns false without touching the heading while a D-pad direction is
    /// held.
    pub fn apply_axes(&mut self, sample: &AxisSample, ranges: &AxisRanges) -> bool {
        if !self.dpad.is_empty() {
            return false;
        }
        let (x, y) = resolve_heading(sample, ranges);
        self.set_heading(x, y);
        true
    }

    pub fn polar_x(&self) -> f32 {
        self.heading_angle.cos()
    }

    pub fn polar_y(&self) -> f32 {
        self.heading_angle.sin()
    }

    /// Produce the wire message for the current angle
    pub fn accelerate(&self) -> HeadingMessage {
        HeadingMessage::from_polar(self.polar_x(), self.polar_y())
    }

    /// Release all held directions and center the heading
    ///
    /// The angle is left as it was, so the next emission repeats the last
    /// significant heading.
    pub fn release_all(&mut self) {
        self.dpad.clear();
        self.set_heading(0.0, 0.0);
    }

    fn set_component(&mut self, direction: Direction, value: f32) {
        if direction.is_horizontal() {
            self.set_heading_x(value);
        } else {
            self.set_heading_y(value);
        }
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::axes::AxisId;
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    fn state() -> DeviceHeadingState {
        DeviceHeadingState::new(DeviceId(7))
    }

    #[test]
    fn test_new_state_is_zeroed() {
        let s = state();
        assert_eq!(s.device_id(), DeviceId(7));
        assert_eq!(s.heading_x(), 0.0);
        assert_eq!(s.heading_y(), 0.0);
        assert_eq!(s.heading_angle(), 0.0);
        assert!(s.dpad().is_empty());
        assert!(s.ranges().is_none());
    }

    #[test]
    fn test_angle_right_and_down() {
        let mut s = state();
        s.set_heading(1.0, 0.0);
        assert!(s.heading_angle().abs() < 1e-6);

        s.set_heading(0.0, 1.0);
        assert!((s.heading_angle() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_dead_zone_keeps_angle() {
        let mut s = state();
        s.set_heading(0.0, 1.0);
        let before = s.heading_angle();

        s.set_heading(0.05, -0.05);
        assert_eq!(s.heading_angle(), before);

        s.set_heading(-0.09, 0.0);
        assert_eq!(s.heading_angle(), before);
    }

    #[test]
    fn test_components_are_clamped() {
        let mut s = state();
        s.set_heading(3.0, -7.5);
        assert_eq!(s.heading_x(), 1.0);
        assert_eq!(s.heading_y(), -1.0);

        s.set_heading(f32::NAN, 0.5);
        assert_eq!(s.heading_x(), 0.0);
    }

    #[test]
    fn test_left_key_down_then_up() {
        let mut s = state();
        s.apply_key(Direction::Up, true, 0);
        s.apply_key(Direction::Right, true, 0);

        assert!(s.apply_key(Direction::Left, true, 0));
        assert_eq!(s.heading_x(), -1.0);
        assert!(s.dpad().contains(DpadMask::LEFT));

        assert!(s.apply_key(Direction::Left, false, 0));
        assert_eq!(s.heading_x(), 0.0);
        assert!(!s.dpad().contains(DpadMask::LEFT));
        // Other held directions are untouched
        assert!(s.dpad().contains(DpadMask::UP));
        assert!(s.dpad().contains(DpadMask::RIGHT));
        assert_eq!(s.heading_y(), -1.0);
    }

    #[test]
    fn test_key_repeat_is_ignored() {
        let mut s = state();
        assert!(!s.apply_key(Direction::Down, true, 1));
        assert_eq!(s.heading_y(), 0.0);
        assert!(s.dpad().is_empty());
    }

    #[test]
    fn test_opposing_keys_both_held() {
        let mut s = state();
        s.apply_key(Direction::Left, true, 0);
        s.apply_key(Direction::Right, true, 0);

        assert_eq!(s.heading_x(), 1.0);
        assert!(s.dpad().contains(DpadMask::LEFT));
        assert!(s.dpad().contains(DpadMask::RIGHT));
    }

    #[test]
    fn test_dpad_key_directions() {
        let mut s = state();
        s.apply_key(Direction::Down, true, 0);
        assert_eq!(s.heading_y(), 1.0);
        assert!((s.heading_angle() - FRAC_PI_2).abs() < 1e-6);

        s.apply_key(Direction::Down, false, 0);
        s.apply_key(Direction::Up, true, 0);
        assert_eq!(s.heading_y(), -1.0);
        assert!((s.heading_angle() + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_dpad_blocks_axes_until_released() {
        let ranges = AxisRanges::uniform(0.1);
        let sample = AxisSample::new().with(AxisId::X, 0.9);
        let mut s = state();

        s.apply_key(Direction::Up, true, 0);
        s.apply_key(Direction::Left, true, 0);
        assert!(!s.apply_axes(&sample, &ranges));
        assert_eq!(s.heading_x(), -1.0);

        s.apply_key(Direction::Up, false, 0);
        assert!(!s.apply_axes(&sample, &ranges));

        s.apply_key(Direction::Left, false, 0);
        assert!(s.apply_axes(&sample, &ranges));
        assert_eq!(s.heading_x(), 0.9);
    }

    #[test]
    fn test_axes_use_fallback_chain() {
        let ranges = AxisRanges::uniform(0.1);
        let sample = AxisSample::new()
            .with(AxisId::X, 0.02)
            .with(AxisId::HatX, 1.0)
            .with(AxisId::Rz, -0.5);
        let mut s = state();

        assert!(s.apply_axes(&sample, &ranges));
        assert_eq!(s.heading_x(), 1.0);
        assert_eq!(s.heading_y(), -0.5);
    }

    #[test]
    fn test_accelerate_angle_zero() {
        let mut s = state();
        s.set_heading(1.0, 0.0);
        assert_eq!(s.accelerate().as_str(), "LA:001 LS:000 ;");
    }

    #[test]
    fn test_accelerate_keeps_stale_angle_in_dead_zone() {
        let mut s = state();
        s.set_heading(-1.0, 0.0);
        s.set_heading(0.0, 0.0);
        assert_eq!(s.accelerate().as_str(), "LA:-01 LS:000 ;");
    }

    #[test]
    fn test_custom_dead_zone() {
        let mut s = DeviceHeadingState::with_dead_zone(DeviceId(1), 0.5);
        s.set_heading(0.0, 0.4);
        assert_eq!(s.heading_angle(), 0.0);
        s.set_heading(0.0, 0.6);
        assert!((s.heading_angle() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_release_all_keeps_angle() {
        let mut s = state();
        s.apply_key(Direction::Left, true, 0);
        s.apply_key(Direction::Down, true, 0);
        let angle = s.heading_angle();

        s.release_all();
        assert!(s.dpad().is_empty());
        assert_eq!(s.heading_x(), 0.0);
        assert_eq!(s.heading_y(), 0.0);
        assert_eq!(s.heading_angle(), angle);
    }

    #[test]
    fn test_device_id_none() {
        assert!(DeviceId::NONE.is_none());
        assert!(!DeviceId(0).is_none());
        assert_eq!(DeviceId(3).to_string(), "device:3");
    }

    proptest! {
        #[test]
        fn prop_dead_zone_angle_is_stale(
            start_x in -1.0f32..1.0,
            start_y in -1.0f32..1.0,
            r in 0.0f32..0.0999,
            theta in -3.14f32..3.14,
        ) {
            let mut s = state();
            s.set_heading(start_x, start_y);
            let before = s.heading_angle();

            s.set_heading(r * theta.cos(), r * theta.sin());
            prop_assert_eq!(s.heading_angle(), before);
        }

        #[test]
        fn prop_dpad_held_ignores_axes(
            x in -1.0f32..1.0,
            y in -1.0f32..1.0,
            dir in 0usize..4,
        ) {
            let direction = [Direction::Left, Direction::Right, Direction::Up, Direction::Down][dir];
            let mut s = state();
            s.apply_key(direction, true, 0);
            let before = s.clone();

            let sample = AxisSample::new().with(AxisId::X, x).with(AxisId::Y, y);
            prop_assert!(!s.apply_axes(&sample, &AxisRanges::uniform(0.0)));
            prop_assert_eq!(s, before);
        }

        #[test]
        fn prop_components_stay_in_unit_range(x in -10.0f32..10.0, y in -10.0f32..10.0) {
            let mut s = state();
            s.set_heading(x, y);
            prop_assert!((-1.0..=1.0).contains(&s.heading_x()));
            prop_assert!((-1.0..=1.0).contains(&s.heading_y()));
        }
    }
}
