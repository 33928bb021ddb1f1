//! fkdump-core: Shared model, record and configuration types for fkdump.
//!
//! This crate provides the foundational types used across all fkdump crates:
//! - Model labels and entity descriptors (fields tagged scalar / foreign key / many-to-many)
//! - Records in Django fixture shape (`model`, `pk`, `fields`)
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use error::FixtureError;
pub use types::{EntityType, FieldDescriptor, FieldKind, ModelLabel, PrimaryKey, Record};
