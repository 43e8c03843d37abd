//! Normalized `(status, body)` result of every PetFriends operation.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{AuthKey, PetList};

/// Decoded response body: JSON when the text parses, the raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            ResponseBody::Json(_) => None,
        }
    }

    /// Top-level field of a JSON object body.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_json().and_then(|v| v.get(field))
    }

    /// Whether the body is a JSON object carrying `field`.
    pub fn contains_key(&self, field: &str) -> bool {
        self.get(field).is_some()
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{value}"),
            ResponseBody::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// Status code and decoded body of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the JSON body into `T`. `None` for text bodies or a shape
    /// mismatch.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        self.body
            .as_json()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The auth key of a successful `get_api_key` response.
    pub fn auth_key(&self) -> Option<AuthKey> {
        self.json()
    }

    /// The pets of a `list_pets` response.
    pub fn pets(&self) -> Option<PetList> {
        self.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_is_decoded() {
        let body = ResponseBody::from_text(r#"{"key":"abc"}"#.to_string());
        assert_eq!(body, ResponseBody::Json(json!({"key": "abc"})));
        assert!(body.contains_key("key"));
    }

    #[test]
    fn undecodable_body_falls_back_to_text() {
        let body = ResponseBody::from_text("<h1>Forbidden</h1>".to_string());
        assert_eq!(body.as_text(), Some("<h1>Forbidden</h1>"));
        assert!(!body.contains_key("key"));
    }

    #[test]
    fn empty_body_is_text() {
        assert_eq!(ResponseBody::from_text(String::new()), ResponseBody::Text(String::new()));
    }

    #[test]
    fn typed_views() {
        let response = ApiResponse {
            status: 200,
            body: ResponseBody::Json(json!({"key": "k1"})),
        };
        assert_eq!(response.auth_key(), Some(AuthKey::new("k1")));
        assert!(response.pets().is_none());
        assert!(response.is_success());

        let forbidden = ApiResponse {
            status: 403,
            body: ResponseBody::Text("Forbidden".to_string()),
        };
        assert!(forbidden.auth_key().is_none());
        assert!(!forbidden.is_success());
    }
}
