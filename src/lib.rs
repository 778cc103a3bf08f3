//! Permitbot - work permit lifecycle with photo evidence and PPE checks
//!
//! This library provides the core functionality for the permitbot CLI, including:
//! - Schema definitions for employees, permits, evidence photos and config
//! - Domain logic for lifecycle states, role gates and the evidence gate
//! - A store contract with in-memory and JSON-file implementations
//! - PPE detection through an external detector process
//! - The service operations the front end calls

pub mod cli;
pub mod config;
pub mod detection;
pub mod domain;
pub mod errors;
pub mod files;
pub mod fs;
pub mod schemas;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use errors::{PermitError, Result};
pub use schemas::{Config, Employee, EvidencePhoto, Permit, PermitStatus, Phase};
pub use service::PermitService;
