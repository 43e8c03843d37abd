//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! request builder produces `HttpRequest` values and parses `HttpResponse`
//! values without touching the network; a `Transport` performs the actual
//! round-trip. Keeping the two apart lets the builder be tested without a
//! server and lets tests swap the transport.
//!
//! Request bodies stay structured (form pairs or multipart parts) until the
//! transport encodes them, so the wire format and its content type are
//! decided in one place.

use std::fmt;

use reqwest::blocking::multipart::{Form, Part};

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A file uploaded as one multipart part.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Request body before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` pairs, in order.
    Form(Vec<(String, String)>),
    /// `multipart/form-data`: text fields first, then the file.
    Multipart {
        fields: Vec<(String, String)>,
        file: FilePart,
    },
}

impl RequestBody {
    /// Value of the text field `name`, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        let fields = match self {
            RequestBody::Form(pairs) => pairs,
            RequestBody::Multipart { fields, .. } => fields,
        };
        fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn file(&self) -> Option<&FilePart> {
        match self {
            RequestBody::Form(_) => None,
            RequestBody::Multipart { file, .. } => Some(file),
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the encoded query string.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Executes a single `HttpRequest`.
///
/// Implementations must report every HTTP status as an `HttpResponse`;
/// only failures to complete the exchange are errors.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `reqwest` client.
///
/// Must not be used from inside an async runtime.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method.into(), url.as_str());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder = match body {
            None => builder,
            Some(RequestBody::Form(pairs)) => builder.form(&pairs),
            Some(RequestBody::Multipart { fields, file }) => builder.multipart(multipart_form(fields, file)?),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        tracing::debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse { status, body })
    }
}

fn multipart_form(fields: Vec<(String, String)>, file: FilePart) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    let part = Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.content_type)?;
    Ok(form.part(file.name, part))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> FilePart {
        FilePart {
            name: "pet_photo".to_string(),
            file_name: "cat1.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8],
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/api/key".to_string(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: None,
        };
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("auth_key"), None);
    }

    #[test]
    fn method_displays_as_verb() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
        assert_eq!(reqwest::Method::from(HttpMethod::Put), reqwest::Method::PUT);
    }

    #[test]
    fn body_field_lookup() {
        let form = RequestBody::Form(vec![("name".to_string(), "Rex".to_string())]);
        assert_eq!(form.field("name"), Some("Rex"));
        assert_eq!(form.field("age"), None);
        assert!(form.file().is_none());

        let multipart = RequestBody::Multipart {
            fields: Vec::new(),
            file: photo(),
        };
        assert_eq!(multipart.file().unwrap().file_name, "cat1.jpg");
    }

    #[test]
    fn multipart_form_rejects_a_bad_content_type() {
        let mut file = photo();
        file.content_type = "not a mime".to_string();
        assert!(matches!(multipart_form(Vec::new(), file), Err(ApiError::Transport(_))));
    }

    #[test]
    fn multipart_form_carries_fields_and_file() {
        let form = multipart_form(vec![("name".to_string(), "Rex".to_string())], photo()).unwrap();
        assert!(!form.boundary().is_empty());
    }
}
