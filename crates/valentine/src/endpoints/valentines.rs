use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use valentine_core::endpoint::{
    Endpoint, EndpointContext, EndpointError, EndpointRequest, EndpointResponse, Method, Result,
};

pub const MAX_MESSAGE_CHARS: usize = 280;

/// `POST /api/valentines` - accept a valentine as JSON. Rendered per request.
pub struct SendValentine;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewValentine {
    to: String,
    #[serde(default)]
    from: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct SentValentine {
    id: Uuid,
    to: String,
    from: String,
    message: String,
    sent_at: DateTime<Utc>,
}

impl NewValentine {
    fn validate(self) -> Result<SentValentine> {
        let to = self.to.trim();
        if to.is_empty() {
            return Err(EndpointError::BadRequest("`to` must not be empty".to_string()));
        }
        let message = self.message.trim();
        if message.is_empty() {
            return Err(EndpointError::BadRequest(
                "`message` must not be empty".to_string(),
            ));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(EndpointError::BadRequest(format!(
                "`message` is longer than {MAX_MESSAGE_CHARS} characters"
            )));
        }
        let from = self
            .from
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("a secret admirer");

        Ok(SentValentine {
            id: Uuid::new_v4(),
            to: to.to_string(),
            from: from.to_string(),
            message: message.to_string(),
            sent_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Endpoint for SendValentine {
    fn pattern(&self) -> &str {
        "/api/valentines"
    }

    fn methods(&self) -> &[Method] {
        &[Method::Post]
    }

    fn prerender(&self) -> Option<bool> {
        Some(false)
    }

    async fn handle(
        &self,
        request: EndpointRequest,
        _ctx: &EndpointContext,
    ) -> Result<EndpointResponse> {
        let sent = request.json::<NewValentine>()?.validate()?;
        tracing::info!(id = %sent.id, to = %sent.to, "Valentine sent");
        EndpointResponse::json(201, &sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: &str) -> EndpointRequest {
        EndpointRequest::new(Method::Post)
            .with_header("content-type", "application/json")
            .with_body(body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_valid_valentine_is_created() {
        let response = SendValentine
            .handle(
                post(r#"{"to": "Ada", "message": "Be mine"}"#),
                &EndpointContext::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(json["to"], "Ada");
        assert_eq!(json["from"], "a secret admirer");
        assert!(Uuid::parse_str(json["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_empty_recipient_is_rejected() {
        let result = SendValentine
            .handle(
                post(r#"{"to": "  ", "message": "Be mine"}"#),
                &EndpointContext::default(),
            )
            .await;
        assert!(matches!(result, Err(EndpointError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_long_message_is_rejected() {
        let body = serde_json::json!({ "to": "Ada", "message": "x".repeat(MAX_MESSAGE_CHARS + 1) });
        let result = SendValentine
            .handle(post(&body.to_string()), &EndpointContext::default())
            .await;
        assert!(matches!(result, Err(EndpointError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_fields_are_rejected() {
        let result = SendValentine
            .handle(
                post(r#"{"to": "Ada", "message": "hi", "ring": true}"#),
                &EndpointContext::default(),
            )
            .await;
        assert!(matches!(result, Err(EndpointError::BadRequest(_))));
    }
}
