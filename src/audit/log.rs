//! Session activity log.
//!
//! Counts what the security service broadcast during a session so an
//! operator can see how busy the system was.

use crate::data::AlarmStatus;
use crate::listener::StatusListener;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Activity counters for the current session.
#[derive(Debug)]
pub struct AuditLog {
    /// Number of alarm status broadcasts
    alarm_changes: AtomicU64,
    /// Number of sensor/arming status broadcasts
    sensor_updates: AtomicU64,
    /// Frames classified as showing a cat
    cat_sightings: AtomicU64,
    /// Frames classified as empty
    clear_frames: AtomicU64,
    /// Most recent alarm status broadcast
    last_alarm_status: Mutex<Option<AlarmStatus>>,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            alarm_changes: AtomicU64::new(0),
            sensor_updates: AtomicU64::new(0),
            cat_sightings: AtomicU64::new(0),
            clear_frames: AtomicU64::new(0),
            last_alarm_status: Mutex::new(None),
            session_start: Utc::now(),
        }
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            alarm_changes: self.alarm_changes.load(Ordering::Relaxed),
            sensor_updates: self.sensor_updates.load(Ordering::Relaxed),
            cat_sightings: self.cat_sightings.load(Ordering::Relaxed),
            clear_frames: self.clear_frames.load(Ordering::Relaxed),
            last_alarm_status: self.last_alarm_status.lock().ok().and_then(|s| *s),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Alarm status changes: {}\n\
             - Sensor status updates: {}\n\
             - Frames with a cat: {}\n\
             - Frames without a cat: {}\n\
             - Last alarm status: {}\n\
             - Session duration: {} seconds",
            stats.alarm_changes,
            stats.sensor_updates,
            stats.cat_sightings,
            stats.clear_frames,
            stats
                .last_alarm_status
                .map(|s| s.description())
                .unwrap_or("unchanged"),
            stats.session_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.alarm_changes.store(0, Ordering::Relaxed);
        self.sensor_updates.store(0, Ordering::Relaxed);
        self.cat_sightings.store(0, Ordering::Relaxed);
        self.clear_frames.store(0, Ordering::Relaxed);
        if let Ok(mut last) = self.last_alarm_status.lock() {
            *last = None;
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusListener for AuditLog {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        self.alarm_changes.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_alarm_status.lock() {
            *last = Some(status);
        }
    }

    fn on_sensor_status_changed(&self) {
        self.sensor_updates.fetch_add(1, Ordering::Relaxed);
    }

    fn on_cat_detected(&self, cat: bool) {
        if cat {
            self.cat_sightings.fetch_add(1, Ordering::Relaxed);
        } else {
            self.clear_frames.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Snapshot of audit statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub alarm_changes: u64,
    pub sensor_updates: u64,
    pub cat_sightings: u64,
    pub clear_frames: u64,
    pub last_alarm_status: Option<AlarmStatus>,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

/// Create a new shared audit log.
pub fn create_shared_log() -> SharedAuditLog {
    Arc::new(AuditLog::new())
}
