//! Domain types for the security system.
//!
//! Statuses are plain `Copy` enums; a [`Sensor`] is the only entity with identity.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Current threat assessment of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    NoAlarm,
    PendingAlarm,
    Alarm,
}

impl AlarmStatus {
    /// Human readable label for display.
    pub fn description(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "Cool and Good",
            AlarmStatus::PendingAlarm => "I'm in Danger...",
            AlarmStatus::Alarm => "Awooga!",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "no_alarm",
            AlarmStatus::PendingAlarm => "pending_alarm",
            AlarmStatus::Alarm => "alarm",
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-selected watch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmingStatus {
    Disarmed,
    ArmedHome,
    ArmedAway,
}

impl ArmingStatus {
    pub fn description(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "Disarmed",
            ArmingStatus::ArmedHome => "Armed - At Home",
            ArmingStatus::ArmedAway => "Armed - Away",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "disarmed",
            ArmingStatus::ArmedHome => "armed_home",
            ArmingStatus::ArmedAway => "armed_away",
        }
    }

    pub fn is_armed(&self) -> bool {
        *self != ArmingStatus::Disarmed
    }
}

impl fmt::Display for ArmingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disarmed" | "disarm" | "off" => Ok(ArmingStatus::Disarmed),
            "home" | "armed_home" => Ok(ArmingStatus::ArmedHome),
            "away" | "armed_away" => Ok(ArmingStatus::ArmedAway),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Kind of physical sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Door,
    Window,
    Motion,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Door => "door",
            SensorType::Window => "window",
            SensorType::Motion => "motion",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "door" => Ok(SensorType::Door),
            "window" => Ok(SensorType::Window),
            "motion" => Ok(SensorType::Motion),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Unrecognized status or sensor type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized value '{}'", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

/// A binary activity source tracked by identity.
///
/// Equality follows the id and ordering follows (name, type, id), never the
/// `active` flag, so a sensor keeps its place in a snapshot while toggling.
/// The identity fields are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    id: Uuid,
    name: String,
    sensor_type: SensorType,
    pub active: bool,
}

impl Sensor {
    /// Create an inactive sensor with a fresh id.
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sensor_type,
            active: false,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }
}

impl PartialEq for Sensor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sensor {}

impl PartialOrd for Sensor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sensor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.sensor_type.cmp(&other.sensor_type))
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sensor_is_inactive() {
        let sensor = Sensor::new("Front Door", SensorType::Door);
        assert!(!sensor.active);
        assert_eq!(sensor.sensor_type(), SensorType::Door);
    }

    #[test]
    fn test_sensor_identity_ignores_active_flag() {
        let sensor = Sensor::new("Hall", SensorType::Motion);
        let toggled = sensor.clone().with_active(true);
        assert_eq!(sensor, toggled);
        assert_eq!(sensor.cmp(&toggled), Ordering::Equal);
    }

    #[test]
    fn test_sensors_order_by_name() {
        let a = Sensor::new("Attic", SensorType::Window);
        let b = Sensor::new("Basement", SensorType::Door);
        assert!(a < b);
    }

    #[test]
    fn test_same_name_orders_by_type_then_id() {
        let door = Sensor::new("Porch", SensorType::Door);
        let motion = Sensor::new("Porch", SensorType::Motion);
        let twin = Sensor::new("Porch", SensorType::Door);

        assert!(door < motion);
        assert!(twin < motion);
        assert_eq!(door.cmp(&twin), door.id().cmp(&twin.id()));
        assert_ne!(door.cmp(&twin), Ordering::Equal);

        let mut sorted = vec![motion.clone(), twin.clone(), door.clone()];
        sorted.sort();
        assert_eq!(sorted.last(), Some(&motion));
    }

    #[test]
    fn test_arming_status_parsing() {
        assert_eq!("home".parse::<ArmingStatus>(), Ok(ArmingStatus::ArmedHome));
        assert_eq!("AWAY".parse::<ArmingStatus>(), Ok(ArmingStatus::ArmedAway));
        assert_eq!("disarm".parse::<ArmingStatus>(), Ok(ArmingStatus::Disarmed));
        assert!("vacation".parse::<ArmingStatus>().is_err());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&AlarmStatus::PendingAlarm).unwrap();
        assert_eq!(json, "\"PENDING_ALARM\"");

        let parsed: SensorType = serde_json::from_str("\"MOTION\"").unwrap();
        assert_eq!(parsed, SensorType::Motion);
    }
}
