//! Error types for the fkdump-relations crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Store error: {0}")]
    Store(#[from] fkdump_store::StoreError),

    #[error(transparent)]
    Codec(#[from] fkdump_codec::CodecError),

    #[error(transparent)]
    Fixture(#[from] fkdump_core::FixtureError),

    #[error("Cannot build a relationship graph from an empty record collection")]
    EmptySeed,

    #[error("Seed records must share one type: expected {expected}, found {found}")]
    MixedSeed { expected: String, found: String },

    #[error("Unknown database: {alias}")]
    UnknownDatabase { alias: String },
}

pub type Result<T> = std::result::Result<T, DumpError>;
