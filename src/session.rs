//! Joystick session - routes host input events to per-device heading state
//!
//! The session stands where the host UI framework would dispatch key, motion
//! and lifecycle callbacks. It owns the [`DeviceRegistry`], applies events to
//! the right [`DeviceHeadingState`](crate::heading::DeviceHeadingState), and
//! after every handled input runs an emission step that sends the current
//! heading of every tracked device.
//!
//! All methods take `&mut self`; the session must be driven from a single
//! task.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::heading::axes::{AxisRanges, MotionEvent};
use crate::heading::{DeviceId, Direction};
use crate::registry::DeviceRegistry;
use crate::transport::HeadingSink;

/// Key reported by the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// D-pad direction key
    Dpad(Direction),
    /// Any other key; not handled by the session
    Other(u32),
}

/// Host input event
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown {
        device: DeviceId,
        key: Key,
        repeat_count: u32,
    },
    KeyUp {
        device: DeviceId,
        key: Key,
    },
    Motion {
        device: DeviceId,
        event: MotionEvent,
    },
    FocusChanged(bool),
    DeviceAdded {
        device: DeviceId,
        ranges: Option<AxisRanges>,
    },
    DeviceChanged {
        device: DeviceId,
        ranges: Option<AxisRanges>,
    },
    DeviceRemoved {
        device: DeviceId,
    },
}

/// Event router and emitter for all connected devices
pub struct JoystickSession {
    registry: DeviceRegistry,
    sink: Arc<dyn HeadingSink>,
    destination: String,
}

impl JoystickSession {
    /// Create a session sending to `destination` through `sink`
    pub fn new(sink: Arc<dyn HeadingSink>, destination: impl Into<String>, dead_zone: f32) -> Self {
        Self {
            registry: DeviceRegistry::with_dead_zone(dead_zone),
            sink,
            destination: destination.into(),
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Change the receiver address; tracked state is kept
    pub fn set_destination(&mut self, destination: impl Into<String>) {
        self.destination = destination.into();
        debug!("Heading destination set to {}", self.destination);
    }

    /// Change the dead zone used for angle updates
    pub fn set_dead_zone(&mut self, dead_zone: f32) {
        self.registry.set_dead_zone(dead_zone);
        debug!("Heading dead zone set to {}", dead_zone);
    }

    /// Dispatch one input event; returns whether it was handled
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::KeyDown {
                device,
                key,
                repeat_count,
            } => self.on_key_down(device, key, repeat_count),
            InputEvent::KeyUp { device, key } => self.on_key_up(device, key),
            InputEvent::Motion { device, event } => self.on_motion(device, &event),
            InputEvent::FocusChanged(has_focus) => {
                self.on_focus_changed(has_focus);
                true
            }
            InputEvent::DeviceAdded { device, ranges } => {
                self.registry.on_device_added(device, ranges);
                true
            }
            InputEvent::DeviceChanged { device, ranges } => {
                self.registry.on_device_changed(device, ranges);
                true
            }
            InputEvent::DeviceRemoved { device } => {
                self.registry.on_device_removed(device);
                true
            }
        }
    }

    /// Key pressed on `device`
    pub fn on_key_down(&mut self, device: DeviceId, key: Key, repeat_count: u32) -> bool {
        self.on_key(device, key, true, repeat_count)
    }

    /// Key released on `device`
    pub fn on_key_up(&mut self, device: DeviceId, key: Key) -> bool {
        self.on_key(device, key, false, 0)
    }

    fn on_key(&mut self, device: DeviceId, key: Key, is_down: bool, repeat_count: u32) -> bool {
        if device.is_none() || !self.registry.is_focused() {
            return false;
        }

        let state = self.registry.resolve(device);
        let handled = match key {
            Key::Dpad(direction) => state.apply_key(direction, is_down, repeat_count),
            Key::Other(_) => false,
        };

        if handled {
            self.step();
        }
        handled
    }

    /// Batched axis motion on `device`
    ///
    /// Ignored while a D-pad direction is held. Otherwise each sample, history
    /// first, updates the heading and triggers one emission step.
    pub fn on_motion(&mut self, device: DeviceId, event: &MotionEvent) -> bool {
        if device.is_none() || !self.registry.is_focused() {
            return false;
        }

        let ranges = {
            let state = self.registry.resolve(device);
            if state.ranges().is_none() {
                state.set_ranges(event.ranges);
            }
            if !state.dpad().is_empty() {
                trace!("D-pad held on {}, ignoring motion", device);
                return true;
            }
            state.ranges().copied().unwrap_or_default()
        };

        for sample in event.samples() {
            self.registry.resolve(device).apply_axes(sample, &ranges);
            self.step();
        }
        true
    }

    pub fn on_focus_changed(&mut self, has_focus: bool) {
        if has_focus {
            self.registry.on_focus_gained();
        } else {
            self.registry.on_focus_lost();
        }
    }

    pub fn on_device_added(&mut self, device: DeviceId, ranges: Option<AxisRanges>) {
        self.registry.on_device_added(device, ranges);
    }

    pub fn on_device_changed(&mut self, device: DeviceId, ranges: Option<AxisRanges>) {
        self.registry.on_device_changed(device, ranges);
    }

    pub fn on_device_removed(&mut self, device: DeviceId) {
        self.registry.on_device_removed(device);
    }

    /// Send the current heading of every tracked device
    ///
    /// Returns the number of messages handed to the sink.
    pub fn step(&self) -> usize {
        let mut emitted = 0;
        for state in self.registry.iter() {
            let message = state.accelerate();
            trace!(
                device = %state.device_id(),
                polar_x = message.polar_x(),
                polar_y = message.polar_y(),
                "Emitting {}",
                message
            );
            self.sink.send(message.as_str(), &self.destination);
            emitted += 1;
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::axes::{AxisId, AxisSample};
    use crate::heading::HEADING_DEAD_ZONE;
    use crate::transport::ConsoleSink;

    const DEST: &str = "192.168.4.1";

    fn session() -> (JoystickSession, Arc<ConsoleSink>) {
        let sink = Arc::new(ConsoleSink::new("test"));
        let session = JoystickSession::new(sink.clone(), DEST, HEADING_DEAD_ZONE);
        (session, sink)
    }

    fn motion(x: f32, y: f32) -> MotionEvent {
        MotionEvent::new(
            AxisSample::new().with(AxisId::X, x).with(AxisId::Y, y),
            AxisRanges::uniform(0.1),
        )
    }

    #[test]
    fn test_key_down_emits_heading() {
        let (mut session, sink) = session();

        assert!(session.on_key_down(DeviceId(1), Key::Dpad(Direction::Right), 0));
        assert_eq!(
            sink.sent(),
            vec![("LA:001 LS:000 ;".to_string(), DEST.to_string())]
        );
    }

    #[test]
    fn test_none_device_is_ignored() {
        let (mut session, sink) = session();

        assert!(!session.on_key_down(DeviceId::NONE, Key::Dpad(Direction::Left), 0));
        assert!(!session.on_motion(DeviceId::NONE, &motion(1.0, 0.0)));
        assert!(session.registry().is_empty());
        assert_eq!(sink.sent_count(), 0);
    }

    #[test]
    fn test_other_key_resolves_but_does_not_emit() {
        let (mut session, sink) = session();

        assert!(!session.on_key_down(DeviceId(3), Key::Other(96), 0));
        assert_eq!(session.registry().len(), 1);
        assert_eq!(sink.sent_count(), 0);
    }

    #[test]
    fn test_repeat_key_does_not_emit() {
        let (mut session, sink) = session();

        assert!(!session.on_key_down(DeviceId(1), Key::Dpad(Direction::Up), 2));
        assert_eq!(sink.sent_count(), 0);
    }

    #[test]
    fn test_key_up_clears_direction() {
        let (mut session, sink) = session();

        session.on_key_down(DeviceId(1), Key::Dpad(Direction::Left), 0);
        assert!(session.on_key_up(DeviceId(1), Key::Dpad(Direction::Left)));

        let state = session.registry().get(DeviceId(1)).unwrap();
        assert_eq!(state.heading_x(), 0.0);
        assert!(state.dpad().is_empty());
        // Angle stays at the last significant heading
        assert_eq!(sink.messages(), vec!["LA:-01 LS:000 ;", "LA:-01 LS:000 ;"]);
    }

    #[test]
    fn test_step_emits_for_every_device() {
        let (mut session, sink) = session();
        session.on_device_added(DeviceId(2), None);
        session.on_device_added(DeviceId(1), None);
        sink.clear();

        session.on_key_down(DeviceId(2), Key::Dpad(Direction::Left), 0);

        // Device 1 first (ascending id), still at angle 0
        assert_eq!(sink.messages(), vec!["LA:001 LS:000 ;", "LA:-01 LS:000 ;"]);
        assert_eq!(session.step(), 2);
    }

    #[test]
    fn test_motion_processes_history_then_current() {
        let (mut session, sink) = session();
        let event = MotionEvent {
            history: vec![
                AxisSample::new().with(AxisId::X, -1.0),
                AxisSample::new().with(AxisId::Y, 1.0),
            ],
            current: AxisSample::new().with(AxisId::X, 1.0),
            ranges: AxisRanges::uniform(0.1),
        };

        assert!(session.on_motion(DeviceId(5), &event));
        assert_eq!(
            sink.messages(),
            vec!["LA:-01 LS:000 ;", "LA:000 LS:001 ;", "LA:001 LS:000 ;"]
        );
    }

    #[test]
    fn test_motion_ignored_while_dpad_held() {
        let (mut session, sink) = session();
        session.on_key_down(DeviceId(1), Key::Dpad(Direction::Down), 0);
        sink.clear();

        assert!(session.on_motion(DeviceId(1), &motion(1.0, 0.0)));
        assert!(sink.messages().is_empty());
        assert_eq!(session.registry().get(DeviceId(1)).unwrap().heading_y(), 1.0);

        session.on_key_up(DeviceId(1), Key::Dpad(Direction::Down));
        sink.clear();
        assert!(session.on_motion(DeviceId(1), &motion(-1.0, 0.0)));
        assert_eq!(sink.messages(), vec!["LA:-01 LS:000 ;"]);
    }

    #[test]
    fn test_motion_adopts_event_ranges_once() {
        let (mut session, _sink) = session();
        let known = AxisRanges::uniform(0.5);
        session.on_device_added(DeviceId(1), Some(known));

        // Event claims a narrow flat, but the device's own ranges win
        session.on_motion(DeviceId(1), &motion(0.3, 0.0));
        let state = session.registry().get(DeviceId(1)).unwrap();
        assert_eq!(state.heading_x(), 0.0);
        assert_eq!(state.ranges(), Some(&known));

        // Unknown device picks up the event's ranges
        session.on_motion(DeviceId(2), &motion(0.3, 0.0));
        let state = session.registry().get(DeviceId(2)).unwrap();
        assert_eq!(state.heading_x(), 0.3);
        assert_eq!(state.ranges(), Some(&AxisRanges::uniform(0.1)));
    }

    #[test]
    fn test_focus_lost_drops_input() {
        let (mut session, sink) = session();

        session.handle(InputEvent::FocusChanged(false));
        assert!(!session.on_key_down(DeviceId(1), Key::Dpad(Direction::Right), 0));
        assert!(!session.on_motion(DeviceId(1), &motion(1.0, 0.0)));
        assert_eq!(sink.sent_count(), 0);

        session.handle(InputEvent::FocusChanged(true));
        assert!(session.on_key_down(DeviceId(1), Key::Dpad(Direction::Right), 0));
        assert_eq!(sink.sent_count(), 1);
    }

    #[test]
    fn test_focus_lost_clears_heading_but_keeps_angle() {
        let (mut session, sink) = session();
        session.on_key_down(DeviceId(1), Key::Dpad(Direction::Left), 0);

        session.on_focus_changed(false);
        let state = session.registry().get(DeviceId(1)).unwrap();
        assert!(state.dpad().is_empty());
        assert_eq!(state.heading_x(), 0.0);
        assert_eq!(state.heading_y(), 0.0);

        sink.clear();
        session.step();
        assert_eq!(sink.messages(), vec!["LA:-01 LS:000 ;"]);
    }

    #[test]
    fn test_dpad_not_latched_across_focus_loss() {
        let (mut session, sink) = session();
        session.on_key_down(DeviceId(1), Key::Dpad(Direction::Left), 0);

        session.on_focus_changed(false);
        // Release happens while unfocused and is dropped
        assert!(!session.on_key_up(DeviceId(1), Key::Dpad(Direction::Left)));
        session.on_focus_changed(true);

        sink.clear();
        assert!(session.on_motion(DeviceId(1), &motion(1.0, 0.0)));

        let state = session.registry().get(DeviceId(1)).unwrap();
        assert!(state.dpad().is_empty());
        assert_eq!(state.heading_x(), 1.0);
        assert_eq!(sink.messages(), vec!["LA:001 LS:000 ;"]);
    }

    #[test]
    fn test_device_removed_stops_emission() {
        let (mut session, sink) = session();
        session.handle(InputEvent::DeviceAdded {
            device: DeviceId(1),
            ranges: None,
        });
        session.handle(InputEvent::DeviceAdded {
            device: DeviceId(2),
            ranges: None,
        });
        session.handle(InputEvent::DeviceRemoved {
            device: DeviceId(1),
        });

        assert_eq!(session.step(), 1);
        assert_eq!(sink.sent_count(), 1);
    }

    #[test]
    fn test_handle_dispatches_keys_and_motion() {
        let (mut session, sink) = session();

        assert!(session.handle(InputEvent::KeyDown {
            device: DeviceId(1),
            key: Key::Dpad(Direction::Up),
            repeat_count: 0,
        }));
        assert!(session.handle(InputEvent::KeyUp {
            device: DeviceId(1),
            key: Key::Dpad(Direction::Up),
        }));
        assert!(session.handle(InputEvent::Motion {
            device: DeviceId(1),
            event: motion(0.0, 1.0),
        }));
        assert!(session.handle(InputEvent::DeviceChanged {
            device: DeviceId(1),
            ranges: Some(AxisRanges::uniform(0.2)),
        }));

        assert_eq!(
            sink.messages(),
            vec!["LA:000 LS:-01 ;", "LA:000 LS:-01 ;", "LA:000 LS:001 ;"]
        );
    }

    #[test]
    fn test_set_destination() {
        let (mut session, sink) = session();
        session.set_destination("10.1.1.1:9000");
        session.on_key_down(DeviceId(1), Key::Dpad(Direction::Right), 0);

        assert_eq!(session.destination(), "10.1.1.1:9000");
        assert_eq!(sink.sent()[0].1, "10.1.1.1:9000");
    }
}
