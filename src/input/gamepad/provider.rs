//! GilRs gamepad provider with hot-plug support
//!
//! gilrs is not `Send`, so the event loop runs on a dedicated OS thread and
//! forwards translated [`InputEvent`]s to the async world over an unbounded
//! channel.

use std::time::Duration;

use gilrs::{Event, EventType, Gilrs};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::axis::{gilrs_axis_to_axis_id, motion_event, ranges_for};
use super::buttons::{key_event, ButtonTransition};
use super::device_id;
use crate::config::InputConfig;
use crate::session::InputEvent;

/// GilRs-based gamepad provider
pub struct GamepadProvider {
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl GamepadProvider {
    /// Start the gilrs thread
    ///
    /// # Arguments
    /// * `settings` - Input settings (poll interval, fallback flat width)
    ///
    /// # Returns
    /// Running provider and the receiving end of its event stream
    pub fn start(settings: InputConfig) -> (Self, mpsc::UnboundedReceiver<InputEvent>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel::<InputEvent>();

        std::thread::spawn(move || {
            Self::event_loop_blocking(settings, event_tx, shutdown_rx);
        });

        (
            Self {
                shutdown_tx: Some(shutdown_tx),
            },
            event_rx,
        )
    }

    /// Main event loop (runs in dedicated blocking thread)
    fn event_loop_blocking(
        settings: InputConfig,
        event_tx: mpsc::UnboundedSender<InputEvent>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("GilRs initialized");
                g
            }
            Err(e) => {
                warn!("Failed to initialize GilRs: {:?}", e);
                return;
            }
        };

        let poll_interval = Duration::from_millis(settings.poll_interval_ms);
        let default_flat = settings.default_flat;

        // Gamepads already plugged in never produce a Connected event
        let connected: Vec<_> = gilrs
            .gamepads()
            .filter(|(_, gp)| gp.is_connected())
            .map(|(id, gp)| {
                info!("  - {:?}: \"{}\"", id, gp.name());
                InputEvent::DeviceAdded {
                    device: device_id(id),
                    ranges: Some(ranges_for(&gp, default_flat)),
                }
            })
            .collect();

        if connected.is_empty() {
            warn!("⚠️  No gamepads detected yet, waiting for hot-plug");
        } else {
            info!("Found {} connected gamepad(s)", connected.len());
        }

        for event in connected {
            if event_tx.send(event).is_err() {
                return;
            }
        }

        loop {
            // Check for shutdown signal (non-blocking)
            match shutdown_rx.try_recv() {
                Ok(_) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("Gamepad provider shutting down");
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            while let Some(Event { id, event, .. }) = gilrs.next_event() {
                let device = device_id(id);

                let input_event = match event {
                    EventType::ButtonPressed(button, _) => {
                        Some(key_event(device, button, ButtonTransition::Pressed))
                    }
                    EventType::ButtonRepeated(button, _) => {
                        Some(key_event(device, button, ButtonTransition::Repeated))
                    }
                    EventType::ButtonReleased(button, _) => {
                        Some(key_event(device, button, ButtonTransition::Released))
                    }
                    EventType::AxisChanged(axis, _, _) if gilrs_axis_to_axis_id(axis).is_some() => {
                        Some(InputEvent::Motion {
                            device,
                            event: motion_event(&gilrs.gamepad(id), default_flat),
                        })
                    }
                    EventType::Connected => {
                        let gamepad = gilrs.gamepad(id);
                        info!("🎮 Gamepad connected: {:?} \"{}\"", id, gamepad.name());
                        Some(InputEvent::DeviceAdded {
                            device,
                            ranges: Some(ranges_for(&gamepad, default_flat)),
                        })
                    }
                    EventType::Disconnected => {
                        info!("🎮 Gamepad disconnected: {:?}", id);
                        Some(InputEvent::DeviceRemoved { device })
                    }
                    _ => None,
                };

                if let Some(input_event) = input_event {
                    debug!("Gamepad event: {:?}", input_event);

                    if event_tx.send(input_event).is_err() {
                        warn!("Event receiver dropped, shutting down gamepad loop");
                        return;
                    }
                }
            }

            // Sleep briefly to avoid busy-waiting
            std::thread::sleep(poll_interval);
        }
    }

    /// Shutdown the provider
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
            info!("Gamepad provider shutdown requested");
        }
    }
}

impl Drop for GamepadProvider {
    fn drop(&mut self) {
        // Attempt to send shutdown signal if not already sent
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
    }
}
