use thiserror::Error;

use super::collection::RejectedEntry;

/// Errors raised by content loading and querying.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContentError {
    #[error("Collection `{collection}` rejected {}", describe(.rejected))]
    StrictLoadFailed {
        collection: String,
        rejected: Vec<RejectedEntry>,
    },
    #[error("Unknown collection `{0}`")]
    UnknownCollection(String),
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

fn describe(rejected: &[RejectedEntry]) -> String {
    let noun = if rejected.len() == 1 { "entry" } else { "entries" };
    let details = rejected
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} {noun}: {details}", rejected.len())
}
