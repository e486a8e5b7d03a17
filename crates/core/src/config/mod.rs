mod env;
mod error;
mod types;

pub use env::{ClientEnv, EnvVars, MIN_SECRET_LEN};
pub use error::ConfigError;
pub use types::{CollectionConfig, EnvConfig, OutputMode, SiteConfig};
