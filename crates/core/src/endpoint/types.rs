use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::routing::PageParams;

use super::error::{EndpointError, Result};

/// HTTP methods an endpoint can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(EndpointError::BadRequest(format!(
                "unsupported method `{other}`"
            ))),
        }
    }
}

/// Request handed to an endpoint. Header names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    pub method: Method,
    pub params: PageParams,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl EndpointRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: PageParams::new(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: PageParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Media type without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Decode a JSON body. The request must declare a JSON content type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self.content_type() {
            Some(ct) if ct == "application/json" || ct.ends_with("+json") => {}
            Some(ct) => return Err(EndpointError::UnsupportedMediaType(ct)),
            None => {
                return Err(EndpointError::UnsupportedMediaType(
                    "missing content-type, expected application/json".to_string(),
                ))
            }
        }
        if self.body.is_empty() {
            return Err(EndpointError::BadRequest("request body is empty".to_string()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| EndpointError::BadRequest(format!("invalid JSON body: {e}")))
    }
}

/// Response produced by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl EndpointResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| EndpointError::Internal(format!("could not encode response: {e}")))?;
        Ok(Self::new(status, body).with_header("content-type", "application/json"))
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into().into_bytes())
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Note {
        to: String,
    }

    fn post(content_type: Option<&str>, body: &str) -> EndpointRequest {
        let request = EndpointRequest::new(Method::Post).with_body(body);
        match content_type {
            Some(ct) => request.with_header("Content-Type", ct),
            None => request,
        }
    }

    #[test]
    fn test_json_body() {
        let note: Note = post(Some("application/json; charset=utf-8"), r#"{"to":"Sam"}"#)
            .json()
            .unwrap();
        assert_eq!(note, Note { to: "Sam".into() });
    }

    #[test]
    fn test_json_requires_json_content_type() {
        let err = post(Some("text/plain"), r#"{"to":"Sam"}"#)
            .json::<Note>()
            .unwrap_err();
        assert_eq!(err, EndpointError::UnsupportedMediaType("text/plain".into()));
        assert!(matches!(
            post(None, "{}").json::<Note>(),
            Err(EndpointError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        assert!(matches!(
            post(Some("application/json"), "{not json").json::<Note>(),
            Err(EndpointError::BadRequest(msg)) if msg.starts_with("invalid JSON body")
        ));
        assert_eq!(
            post(Some("application/json"), "").json::<Note>(),
            Err(EndpointError::BadRequest("request body is empty".into()))
        );
    }

    #[test]
    fn test_query_string() {
        let request = EndpointRequest::new(Method::Get).with_query_string("?name=Be%20Mine&x=1");
        assert_eq!(request.query["name"], "Be Mine");
        assert_eq!(request.query["x"], "1");
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_json_response() {
        let response = EndpointResponse::json(201, &json!({"id": 1})).unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.body, br#"{"id":1}"#);
    }
}
