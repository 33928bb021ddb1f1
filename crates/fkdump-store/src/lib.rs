//! fkdump Store — schema introspection and record fetching.
//!
//! Traversal code never issues queries of its own. Everything it knows about
//! types and records comes through the four primitives of [`ModelStore`]:
//! describe a type, fetch all of a type, fetch by primary-key set, and fetch
//! the related set of a record's many-to-many field.

pub mod dataset;
pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{ModelStore, StoreError};
