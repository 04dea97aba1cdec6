//! Status listeners and the registry the security service broadcasts through.

use crate::data::AlarmStatus;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Observer of security system state changes.
pub trait StatusListener: Send + Sync {
    fn on_alarm_status_changed(&self, status: AlarmStatus);

    /// Sensor or arming state changed; listeners re-read what they display.
    fn on_sensor_status_changed(&self);

    fn on_cat_detected(&self, cat: bool);
}

/// Shared listener handle.
pub type ListenerHandle = Arc<dyn StatusListener>;

/// Explicitly owned set of listeners.
///
/// Handles are compared by pointer, so registering the same `Arc` twice keeps
/// a single entry. Events go out in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<ListenerHandle>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: ListenerHandle) {
        if !self.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    pub fn remove(&mut self, listener: &ListenerHandle) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn contains(&self, listener: &ListenerHandle) -> bool {
        self.listeners.iter().any(|l| Arc::ptr_eq(l, listener))
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn notify_alarm_status(&self, status: AlarmStatus) {
        for listener in &self.listeners {
            listener.on_alarm_status_changed(status);
        }
    }

    pub fn notify_sensor_status(&self) {
        for listener in &self.listeners {
            listener.on_sensor_status_changed();
        }
    }

    pub fn notify_cat_detected(&self, cat: bool) {
        for listener in &self.listeners {
            listener.on_cat_detected(cat);
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A listener notification as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum StatusEvent {
    AlarmStatusChanged(AlarmStatus),
    SensorStatusChanged,
    CatDetected(bool),
}

/// Forwards notifications over a channel.
///
/// Sends never block; events are dropped once the receiver is gone.
pub struct ChannelListener {
    sender: Sender<StatusEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<StatusEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, event: StatusEvent) {
        let _ = self.sender.send(event);
    }
}

impl StatusListener for ChannelListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        self.send(StatusEvent::AlarmStatusChanged(status));
    }

    fn on_sensor_status_changed(&self) {
        self.send(StatusEvent::SensorStatusChanged);
    }

    fn on_cat_detected(&self, cat: bool) {
        self.send(StatusEvent::CatDetected(cat));
    }
}

/// Writes every notification to the `tracing` log at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl StatusListener for LoggingListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        debug!(status = %status, description = status.description(), "alarm_status_changed");
    }

    fn on_sensor_status_changed(&self) {
        debug!("sensor_status_changed");
    }

    fn on_cat_detected(&self, cat: bool) {
        debug!(cat = %cat, "cat_detection");
    }
}
