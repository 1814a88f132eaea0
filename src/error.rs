use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuleError>;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("rule not found: {0}")]
    NotFound(String),

    #[error("unknown bundle: {0}")]
    UnknownBundle(String),

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid discovery pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
