//! Catpoint Security - alarm-state engine for a home security controller.
//!
//! The [`SecurityService`] decides the alarm status from three inputs: the
//! operator's arming mode, sensor activity and camera cat detection. Each
//! decision is written through a [`SecurityRepository`] and broadcast to
//! every registered [`StatusListener`].
//!
//! # Architecture
//!
//! ```text
//!  arming change ──┐
//!  sensor toggle ──┼──▶ SecurityService ──▶ SecurityRepository
//!  camera frame ───┘          │   ▲
//!                             │   └── ImageService (contains_cat)
//!                             ▼
//!                      ListenerRegistry ──▶ StatusListener(s)
//! ```
//!
//! # Example
//!
//! ```
//! use catpoint_security::{
//!     AlarmStatus, ArmingStatus, FakeImageService, InMemoryRepository, SecurityRepository,
//!     SecurityService, Sensor, SensorType,
//! };
//!
//! let mut door = Sensor::new("Front Door", SensorType::Door);
//! let mut repository = InMemoryRepository::new();
//! repository.set_arming_status(ArmingStatus::ArmedAway).unwrap();
//! repository.add_sensor(door.clone()).unwrap();
//!
//! let mut service = SecurityService::new(repository, FakeImageService::new());
//! service.change_sensor_activation_status(&mut door, true).unwrap();
//!
//! assert_eq!(service.alarm_status().unwrap(), AlarmStatus::PendingAlarm);
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod image;
pub mod listener;
pub mod service;

// Re-export key types at crate root for convenience
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use config::{Config, ConfigError, SensorConfig};
pub use data::{
    AlarmStatus, ArmingStatus, InMemoryRepository, RepositoryError, SecurityRepository, Sensor,
    SensorType,
};
pub use error::SecurityError;
pub use image::{CameraImage, FakeImageService, ImageError, ImageService};
pub use listener::{
    ChannelListener, ListenerHandle, ListenerRegistry, LoggingListener, StatusEvent,
    StatusListener,
};
pub use service::{create_shared_service, SecurityService, SharedSecurityService};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
