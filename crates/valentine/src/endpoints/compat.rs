use async_trait::async_trait;
use serde::Serialize;
use valentine_core::endpoint::{
    Endpoint, EndpointContext, EndpointError, EndpointRequest, EndpointResponse, Result,
};

/// `GET /api/compat/[a]/[b]` - a deterministic compatibility score for two
/// names. Rendered per request.
pub struct Compatibility;

#[derive(Debug, Serialize, PartialEq)]
struct Match {
    a: String,
    b: String,
    score: u32,
    verdict: &'static str,
}

/// Score in `0..=100`, independent of argument order and letter case.
pub fn compatibility_score(a: &str, b: &str) -> u32 {
    let mut names = [a.trim().to_lowercase(), b.trim().to_lowercase()];
    names.sort();
    let hash = names
        .join("\u{2665}")
        .bytes()
        .fold(2166136261u32, |h, byte| (h ^ u32::from(byte)).wrapping_mul(16777619));
    hash % 101
}

fn verdict(score: u32) -> &'static str {
    match score {
        80.. => "soulmates",
        50..=79 => "sweethearts",
        20..=49 => "friends",
        _ => "just chocolates",
    }
}

#[async_trait]
impl Endpoint for Compatibility {
    fn pattern(&self) -> &str {
        "/api/compat/[a]/[b]"
    }

    fn prerender(&self) -> Option<bool> {
        Some(false)
    }

    async fn handle(
        &self,
        request: EndpointRequest,
        _ctx: &EndpointContext,
    ) -> Result<EndpointResponse> {
        let (Some(a), Some(b)) = (request.params.get_str("a"), request.params.get_str("b")) else {
            return Err(EndpointError::BadRequest("two names are required".to_string()));
        };
        let score = compatibility_score(&a, &b);
        EndpointResponse::json(
            200,
            &Match {
                a,
                b,
                score,
                verdict: verdict(score),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_symmetric_and_case_insensitive() {
        let score = compatibility_score("Romeo", "Juliet");
        assert_eq!(score, compatibility_score("juliet", "ROMEO"));
        assert!(score <= 100);
    }

    #[test]
    fn test_verdict_bands() {
        assert_eq!(verdict(100), "soulmates");
        assert_eq!(verdict(50), "sweethearts");
        assert_eq!(verdict(20), "friends");
        assert_eq!(verdict(0), "just chocolates");
    }
}
