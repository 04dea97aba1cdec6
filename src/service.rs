//! Alarm decision engine.
//!
//! [`SecurityService`] receives sensor toggles, camera frames and arming
//! changes, decides the resulting alarm status, writes it through the
//! repository and then tells every registered listener.
//!
//! # Alarm ladder
//!
//! ```text
//!   current        sensor activated (armed)   sensor deactivated
//!   NoAlarm        PendingAlarm               Alarm
//!   PendingAlarm   Alarm                      NoAlarm
//!   Alarm          Alarm                      Alarm
//! ```
//!
//! Once at `Alarm`, sensor changes no longer move the status.
//! Disarming always clears to `NoAlarm`. A cat seen while armed-home always
//! raises `Alarm`.

use crate::data::{AlarmStatus, ArmingStatus, SecurityRepository, Sensor};
use crate::error::SecurityError;
use crate::image::{CameraImage, ImageService, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::listener::{ListenerHandle, ListenerRegistry};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Owns the alarm rules and the collaborators they act through.
///
/// Every entry point takes `&mut self`, so a single event reads and writes
/// a consistent view of alarm and arming status.
pub struct SecurityService<R, I> {
    repository: R,
    image_service: I,
    listeners: ListenerRegistry,
    /// Whether the most recently processed frame showed a cat
    cat_detected: bool,
    confidence_threshold: f32,
}

impl<R, I> SecurityService<R, I>
where
    R: SecurityRepository,
    I: ImageService,
{
    pub fn new(repository: R, image_service: I) -> Self {
        Self {
            repository,
            image_service,
            listeners: ListenerRegistry::new(),
            cat_detected: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Override the confidence a frame needs before it counts as a cat.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Change the arming status, updating alarm and sensor state to match.
    ///
    /// Arming resets every sensor to inactive through the regular
    /// deactivation path, so the reset is subject to the same alarm rules
    /// as an individual sensor turning off.
    pub fn set_arming_status(&mut self, arming_status: ArmingStatus) -> Result<(), SecurityError> {
        if self.cat_detected && arming_status == ArmingStatus::ArmedHome {
            debug!("cat_in_view_while_arming_home");
            self.set_alarm_status(AlarmStatus::Alarm)?;
        }

        if arming_status == ArmingStatus::Disarmed {
            self.set_alarm_status(AlarmStatus::NoAlarm)?;
        } else {
            let snapshot = self.repository.sensors()?;
            debug!(sensors = snapshot.len(), "resetting_sensors_on_arm");
            for mut sensor in snapshot {
                self.change_sensor_activation_status(&mut sensor, false)?;
            }
        }

        self.repository.set_arming_status(arming_status)?;
        info!(arming_status = %arming_status, "arming_status_changed");

        self.listeners.notify_sensor_status();
        Ok(())
    }

    /// Persist a new alarm status and broadcast it.
    pub fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), SecurityError> {
        self.repository.set_alarm_status(status)?;
        info!(status = %status, "alarm_status_set");
        self.listeners.notify_alarm_status(status);
        Ok(())
    }

    /// Set a sensor's activation state and react to it.
    ///
    /// `sensor` must still carry its previous state; it is updated in place
    /// and written back to the repository.
    pub fn change_sensor_activation_status(
        &mut self,
        sensor: &mut Sensor,
        active: bool,
    ) -> Result<(), SecurityError> {
        let alarm_status = self.repository.alarm_status()?;

        if alarm_status != AlarmStatus::Alarm {
            if active {
                self.handle_sensor_activated()?;
            } else if sensor.active {
                self.handle_sensor_deactivated()?;
            }
        }

        debug!(sensor = %sensor.name(), from = sensor.active, to = active, "sensor_activation_changed");
        sensor.active = active;
        self.repository.update_sensor(sensor)?;
        Ok(())
    }

    /// React to a sensor whose `active` flag the caller already changed.
    pub fn sync_sensor_status(&mut self, sensor: &Sensor) -> Result<(), SecurityError> {
        let alarm_status = self.repository.alarm_status()?;
        let arming_status = self.repository.arming_status()?;

        if alarm_status == AlarmStatus::PendingAlarm && !sensor.active {
            self.handle_sensor_deactivated()?;
        } else if alarm_status == AlarmStatus::Alarm && arming_status == ArmingStatus::Disarmed {
            self.handle_sensor_deactivated()?;
        }

        self.repository.update_sensor(sensor)?;
        Ok(())
    }

    /// Classify a camera frame and update alarm status from the result.
    pub fn process_image(&mut self, image: &CameraImage) -> Result<(), SecurityError> {
        let cat = self
            .image_service
            .contains_cat(image, self.confidence_threshold)?;
        self.cat_detected(cat)
    }

    fn cat_detected(&mut self, cat: bool) -> Result<(), SecurityError> {
        self.cat_detected = cat;

        if cat && self.repository.arming_status()? == ArmingStatus::ArmedHome {
            self.set_alarm_status(AlarmStatus::Alarm)?;
        } else if !cat && self.all_sensors_inactive()? {
            self.set_alarm_status(AlarmStatus::NoAlarm)?;
        }

        self.listeners.notify_cat_detected(cat);
        Ok(())
    }

    fn all_sensors_inactive(&self) -> Result<bool, SecurityError> {
        Ok(self.repository.sensors()?.iter().all(|s| !s.active))
    }

    fn handle_sensor_activated(&mut self) -> Result<(), SecurityError> {
        if !self.repository.arming_status()?.is_armed() {
            return Ok(());
        }
        match self.repository.alarm_status()? {
            AlarmStatus::NoAlarm => self.set_alarm_status(AlarmStatus::PendingAlarm),
            AlarmStatus::PendingAlarm => self.set_alarm_status(AlarmStatus::Alarm),
            AlarmStatus::Alarm => Ok(()),
        }
    }

    fn handle_sensor_deactivated(&mut self) -> Result<(), SecurityError> {
        match self.repository.alarm_status()? {
            AlarmStatus::PendingAlarm => self.set_alarm_status(AlarmStatus::NoAlarm),
            AlarmStatus::Alarm => self.set_alarm_status(AlarmStatus::PendingAlarm),
            // FIXME: a sensor turning off with no alarm raised escalates; confirm with product.
            AlarmStatus::NoAlarm => self.set_alarm_status(AlarmStatus::Alarm),
        }
    }

    /// Register a listener. Registering the same handle twice has no effect.
    pub fn add_status_listener(&mut self, listener: ListenerHandle) {
        self.listeners.add(listener);
    }

    /// Unregister a listener. Unknown handles are ignored.
    pub fn remove_status_listener(&mut self, listener: &ListenerHandle) {
        self.listeners.remove(listener);
    }

    pub fn alarm_status(&self) -> Result<AlarmStatus, SecurityError> {
        Ok(self.repository.alarm_status()?)
    }

    pub fn arming_status(&self) -> Result<ArmingStatus, SecurityError> {
        Ok(self.repository.arming_status()?)
    }

    pub fn sensors(&self) -> Result<Vec<Sensor>, SecurityError> {
        Ok(self.repository.sensors()?)
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> Result<(), SecurityError> {
        Ok(self.repository.add_sensor(sensor)?)
    }

    pub fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), SecurityError> {
        Ok(self.repository.remove_sensor(sensor)?)
    }

    pub fn is_cat_detected(&self) -> bool {
        self.cat_detected
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

/// Thread-safe shared security service. Each event runs under the lock.
pub type SharedSecurityService<R, I> = Arc<Mutex<SecurityService<R, I>>>;

/// Wrap a service for use from multiple threads.
pub fn create_shared_service<R, I>(service: SecurityService<R, I>) -> SharedSecurityService<R, I>
where
    R: SecurityRepository,
    I: ImageService,
{
    Arc::new(Mutex::new(service))
}
