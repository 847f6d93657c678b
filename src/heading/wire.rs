//! Heading wire format
//!
//! Receivers expect a fixed ASCII command per heading update:
//!
//! ```text
//! LA:<x> LS:<y> ;
//! ```
//!
//! Each component is the cosine/sine of the heading angle, truncated toward
//! zero to an integer and zero-padded to a width of 3. Since both values lie
//! in [-1, 1] the fields only ever read `001`, `000` or `-01`.

use std::fmt;

/// A formatted heading update ready for the transport
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingMessage {
    polar_x: f32,
    polar_y: f32,
    text: String,
}

impl HeadingMessage {
    /// Build the message for a polar heading (`cos`, `sin` of the angle)
    pub fn from_polar(polar_x: f32, polar_y: f32) -> Self {
        Self {
            polar_x,
            polar_y,
            text: format_heading_message(polar_x, polar_y),
        }
    }

    /// Wire text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Unformatted horizontal component, for logging
    pub fn polar_x(&self) -> f32 {
        self.polar_x
    }

    /// Unformatted vertical component, for logging
    pub fn polar_y(&self) -> f32 {
        self.polar_y
    }
}

impl fmt::Display for HeadingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Format one component: truncate toward zero, pad to 3 characters
///
/// The sign counts toward the width, so `-1.0` becomes `-01`. Non-finite
/// values format as `000`.
pub fn format_component(value: f32) -> String {
    let truncated = if value.is_finite() {
        value.trunc() as i32
    } else {
        0
    };
    format!("{:03}", truncated)
}

/// Format the full `LA:... LS:... ;` command
pub fn format_heading_message(polar_x: f32, polar_y: f32) -> String {
    format!(
        "LA:{} LS:{} ;",
        format_component(polar_x),
        format_component(polar_y)
    )
}
