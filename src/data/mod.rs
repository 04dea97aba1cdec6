//! Data layer for the security system.
//!
//! This module contains:
//! - Status enums and the sensor entity
//! - The repository contract the security service persists through
//! - An in-memory repository used by the CLI and tests

pub mod repository;
pub mod types;

// Re-export commonly used types
pub use repository::{InMemoryRepository, RepositoryError, SecurityRepository};
pub use types::{AlarmStatus, ArmingStatus, ParseStatusError, Sensor, SensorType};
