//! Repository contract for sensors and system status.
//!
//! The security service reads and writes everything through
//! [`SecurityRepository`]; it never caches what it reads.

use crate::data::types::{AlarmStatus, ArmingStatus, Sensor};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Durable store of sensors, alarm status and arming status.
pub trait SecurityRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError>;

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError>;

    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError>;

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError>;

    /// All known sensors.
    ///
    /// The returned collection is owned by the caller and is not affected by
    /// later writes, so it can be iterated while sensors are being updated.
    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError>;

    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError>;

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError>;

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError>;
}

/// Errors reported by a repository implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The sensor is not registered with the repository
    UnknownSensor(Uuid),
    /// The backing store could not be reached
    Unavailable(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::UnknownSensor(id) => write!(f, "Unknown sensor: {id}"),
            RepositoryError::Unavailable(e) => write!(f, "Repository unavailable: {e}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Process-local repository. Starts disarmed with no alarm.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    sensors: BTreeMap<Uuid, Sensor>,
    alarm_status: AlarmStatus,
    arming_status: ArmingStatus,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            sensors: BTreeMap::new(),
            alarm_status: AlarmStatus::NoAlarm,
            arming_status: ArmingStatus::Disarmed,
        }
    }

    /// Create a repository preloaded with the given state.
    pub fn with_state(
        alarm_status: AlarmStatus,
        arming_status: ArmingStatus,
        sensors: impl IntoIterator<Item = Sensor>,
    ) -> Self {
        Self {
            sensors: sensors.into_iter().map(|s| (s.id(), s)).collect(),
            alarm_status,
            arming_status,
        }
    }

    /// Look up a sensor by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Sensor> {
        self.sensors.values().find(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityRepository for InMemoryRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError> {
        Ok(self.alarm_status)
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError> {
        self.alarm_status = status;
        Ok(())
    }

    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError> {
        Ok(self.arming_status)
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError> {
        self.arming_status = status;
        Ok(())
    }

    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError> {
        let mut sensors: Vec<Sensor> = self.sensors.values().cloned().collect();
        sensors.sort();
        Ok(sensors)
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError> {
        self.sensors.insert(sensor.id(), sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        self.sensors
            .remove(&sensor.id())
            .map(|_| ())
            .ok_or(RepositoryError::UnknownSensor(sensor.id()))
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        match self.sensors.get_mut(&sensor.id()) {
            Some(stored) => {
                *stored = sensor.clone();
                Ok(())
            }
            None => Err(RepositoryError::UnknownSensor(sensor.id())),
        }
    }
}
