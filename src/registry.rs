//! Device registry: device id → heading state
//!
//! States are created on first use and dropped when the device goes away.
//! The registry also carries the host lifecycle callbacks (focus and device
//! notifications). It is not synchronized; the owning session confines it to
//! a single task.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::heading::axes::AxisRanges;
use crate::heading::{DeviceHeadingState, DeviceId, HEADING_DEAD_ZONE};

/// Tracks one [`DeviceHeadingState`] per connected device
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: BTreeMap<DeviceId, DeviceHeadingState>,
    dead_zone: f32,
    focused: bool,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::with_dead_zone(HEADING_DEAD_ZONE)
    }

    /// Registry whose new states use `dead_zone` for angle updates
    pub fn with_dead_zone(dead_zone: f32) -> Self {
        Self {
            devices: BTreeMap::new(),
            dead_zone,
            focused: true,
        }
    }

    /// Return the state for `id`, creating a zeroed one if unknown
    pub fn resolve(&mut self, id: DeviceId) -> &mut DeviceHeadingState {
        let dead_zone = self.dead_zone;
        self.devices.entry(id).or_insert_with(|| {
            debug!("Tracking new device {}", id);
            DeviceHeadingState::with_dead_zone(id, dead_zone)
        })
    }

    /// Drop the state for `id`; unknown ids are ignored
    pub fn remove(&mut self, id: DeviceId) -> Option<DeviceHeadingState> {
        let removed = self.devices.remove(&id);
        if removed.is_some() {
            debug!("Stopped tracking device {}", id);
        }
        removed
    }

    pub fn get(&self, id: DeviceId) -> Option<&DeviceHeadingState> {
        self.devices.get(&id)
    }

    /// States in ascending device id order
    pub fn iter(&self) -> impl Iterator<Item = &DeviceHeadingState> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn dead_zone(&self) -> f32 {
        self.dead_zone
    }

    /// Change the dead zone of tracked and future states
    pub fn set_dead_zone(&mut self, dead_zone: f32) {
        self.dead_zone = dead_zone;
        for state in self.devices.values_mut() {
            state.set_dead_zone(dead_zone);
        }
    }

    /// Whether input should currently be processed
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Host lost input focus: pause processing
    ///
    /// Releases that arrive while unfocused are never seen, so every device
    /// drops its held directions and centers its heading here.
    pub fn on_focus_lost(&mut self) {
        if self.focused {
            info!("Input focus lost, pausing heading updates");
        }
        self.focused = false;
        for state in self.devices.values_mut() {
            state.release_all();
        }
    }

    /// Host regained input focus: resume processing
    pub fn on_focus_gained(&mut self) {
        if !self.focused {
            info!("Input focus regained, resuming heading updates");
        }
        self.focused = true;
    }

    /// A device connected; start tracking it with its reported ranges
    pub fn on_device_added(&mut self, id: DeviceId, ranges: Option<AxisRanges>) {
        info!("Input device added: {}", id);
        let state = self.resolve(id);
        if let Some(ranges) = ranges {
            state.set_ranges(ranges);
        }
    }

    /// A device's capabilities changed; refresh its ranges
    pub fn on_device_changed(&mut self, id: DeviceId, ranges: Option<AxisRanges>) {
        debug!("Input device changed: {}", id);
        let state = self.resolve(id);
        if let Some(ranges) = ranges {
            state.set_ranges(ranges);
        }
    }

    /// A device disconnected; forget it
    pub fn on_device_removed(&mut self, id: DeviceId) {
        info!("Input device removed: {}", id);
        self.remove(id);
    }
}
