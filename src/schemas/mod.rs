//! Schema types for permitbot
//!
//! Serde data model shared by the store, the lifecycle engine and the CLI.

mod config;
mod employee;
mod permit;
mod photo;

pub use config::{Config, DetectorConfig, TimestampPolicy};
pub use employee::{Employee, EmployeeRole};
pub use permit::{ParticipantRole, Permit, PermitStatus, Phase, RoleFilter};
pub use photo::EvidencePhoto;
