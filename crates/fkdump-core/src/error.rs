use thiserror::Error;

/// Errors shared by every fkdump crate.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Invalid model label '{label}': expected app_label.ModelName")]
    InvalidLabel { label: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, FixtureError>;
