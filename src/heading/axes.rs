//! Motion samples and flat-region axis resolution
//!
//! A controller reports every axis independently, and a stick at rest rarely
//! reports an exact zero. Each axis therefore comes with a device-reported
//! "flat" width: readings whose magnitude is within it count as centered.
//!
//! The analog path reads the heading from a fallback chain of axes so that
//! pads exposing the direction on a hat or on the second stick still work:
//!
//! ```text
//! X: X ──► HatX ──► Z
//! Y: Y ──► HatY ──► Rz
//! ```
//!
//! The first axis in a chain with a non-centered value wins.

/// Logical joystick axes read by the analog path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxisId {
    /// Primary stick, horizontal
    X,
    /// Primary stick, vertical (positive is down)
    Y,
    /// Hat switch, horizontal
    HatX,
    /// Hat switch, vertical (positive is down)
    HatY,
    /// Second stick, horizontal
    Z,
    /// Second stick, vertical (positive is down)
    Rz,
}

impl AxisId {
    /// Every axis, in storage order
    pub const ALL: [AxisId; 6] = [
        AxisId::X,
        AxisId::Y,
        AxisId::HatX,
        AxisId::HatY,
        AxisId::Z,
        AxisId::Rz,
    ];

    fn index(self) -> usize {
        match self {
            AxisId::X => 0,
            AxisId::Y => 1,
            AxisId::HatX => 2,
            AxisId::HatY => 3,
            AxisId::Z => 4,
            AxisId::Rz => 5,
        }
    }
}

/// Fallback order for the horizontal heading component
pub const X_CHAIN: [AxisId; 3] = [AxisId::X, AxisId::HatX, AxisId::Z];

/// Fallback order for the vertical heading component
pub const Y_CHAIN: [AxisId; 3] = [AxisId::Y, AxisId::HatY, AxisId::Rz];

/// Per-axis flat-region widths reported by a device
///
/// An axis without a width is one the device does not expose; it always
/// resolves to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisRanges {
    flats: [Option<f32>; 6],
}

impl AxisRanges {
    /// Ranges with no axis exposed
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranges exposing every axis with the same flat width
    pub fn uniform(flat: f32) -> Self {
        Self {
            flats: [Some(flat); 6],
        }
    }

    /// Builder form of [`set_flat`](Self::set_flat)
    pub fn with_flat(mut self, axis: AxisId, flat: f32) -> Self {
        self.set_flat(axis, flat);
        self
    }

    pub fn set_flat(&mut self, axis: AxisId, flat: f32) {
        self.flats[axis.index()] = Some(flat.abs());
    }

    pub fn flat(&self, axis: AxisId) -> Option<f32> {
        self.flats[axis.index()]
    }

    /// True when no axis is exposed at all
    pub fn is_empty(&self) -> bool {
        self.flats.iter().all(Option::is_none)
    }
}

/// One snapshot of axis values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisSample {
    values: [f32; 6],
}

impl AxisSample {
    /// Sample with every axis centered
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, axis: AxisId, value: f32) -> Self {
        self.set(axis, value);
        self
    }

    pub fn set(&mut self, axis: AxisId, value: f32) {
        self.values[axis.index()] = value;
    }

    pub fn value(&self, axis: AxisId) -> f32 {
        self.values[axis.index()]
    }
}

/// A batched motion event from one device
///
/// Older samples coalesced by the input source come first in `history`;
/// `current` is the newest reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionEvent {
    pub history: Vec<AxisSample>,
    pub current: AxisSample,
    /// Ranges of the device that produced the event
    pub ranges: AxisRanges,
}

impl MotionEvent {
    /// Single-sample event without history
    pub fn new(current: AxisSample, ranges: AxisRanges) -> Self {
        Self {
            history: Vec::new(),
            current,
            ranges,
        }
    }

    /// Samples in processing order: history oldest first, then current
    pub fn samples(&self) -> impl Iterator<Item = &AxisSample> {
        self.history.iter().chain(std::iter::once(&self.current))
    }
}

/// Treat a reading within the flat region as exactly 0
///
/// Unexposed axes (`flat == None`) and unreadable values (NaN) resolve to 0.
pub fn centered_axis(value: f32, flat: Option<f32>) -> f32 {
    match flat {
        Some(flat) if value.abs() > flat => value,
        _ => 0.0,
    }
}

/// Walk a fallback chain and return the first non-centered value
pub fn resolve_chain(sample: &AxisSample, ranges: &AxisRanges, chain: &[AxisId]) -> f32 {
    chain
        .iter()
        .map(|axis| centered_axis(sample.value(*axis), ranges.flat(*axis)))
        .find(|value| *value != 0.0)
        .unwrap_or(0.0)
}

/// Resolve both heading components from a sample
pub fn resolve_heading(sample: &AxisSample, ranges: &AxisRanges) -> (f32, f32) {
    (
        resolve_chain(sample, ranges, &X_CHAIN),
        resolve_chain(sample, ranges, &Y_CHAIN),
    )
}
