//! agro-registry domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `policy`: Document normalization and the farm area invariant
//! - `usecases`: Entity services, integrity guards and the dashboard
//! - `error`: The error type shared by every service

pub mod error;
pub mod model;
pub mod policy;
pub mod ports;
pub mod usecases;

pub use error::ServiceError;
pub use model::*;
pub use ports::*;
