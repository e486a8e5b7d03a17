use thiserror::Error;

/// Errors raised while deciding or emitting an island's hydration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HydrationError {
    #[error("Unknown hydration directive `client:{0}`")]
    UnknownDirective(String),
    #[error("`client:media` requires a media query")]
    MissingMediaQuery,
    #[error("`client:only` requires a target runtime")]
    MissingRuntime,
    #[error("Island `{component}` props expose the non-public environment variable `{variable}`")]
    PrivateEnvLeak { component: String, variable: String },
    #[error("Props for island `{component}` could not be serialized: {reason}")]
    Serialization { component: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hydration_error_display() {
        assert_eq!(
            HydrationError::UnknownDirective("hover".to_string()).to_string(),
            "Unknown hydration directive `client:hover`"
        );
        assert_eq!(
            HydrationError::PrivateEnvLeak {
                component: "Counter".to_string(),
                variable: "DATABASE_URL".to_string(),
            }
            .to_string(),
            "Island `Counter` props expose the non-public environment variable `DATABASE_URL`"
        );
    }
}
