use thiserror::Error;

/// Errors raised while reading `valentine.toml`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(String),
    #[error("Invalid base path `{0}`: expected a path such as `/` or `/docs/`")]
    InvalidBase(String),
    #[error("The public environment prefix must not be empty")]
    EmptyPublicPrefix,
}
