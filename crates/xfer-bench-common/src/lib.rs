//! xfer-bench-common - Shared types for the transport experiment suite
//!
//! This crate provides the types shared between the run coordinator and
//! the result normalizer, without pulling in HTTP or CLI dependencies.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`protocol`]: Protocol, environment and time-slot enums
//! - [`record`]: The raw/cleaned result record and its derived metrics
//! - [`schema`]: Declared field descriptors for the result table

pub mod defaults;
pub mod protocol;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use protocol::{Environment, Protocol, TimeSlot};
pub use record::ResultRecord;
pub use schema::{FieldDescriptor, ResultSchema};
