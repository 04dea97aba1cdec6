//! Audit module for the security system.
//!
//! Tracks what the security service reported during a session.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, AuditLog, AuditStats, SharedAuditLog};
