//! Stateless HTTP request builder and response parser for the PetFriends API.
//!
//! # Design
//! `PetFriendsClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint has a `build_*` method that produces an
//! `HttpRequest`; every response goes through the same `parse` step, which
//! never fails: any status is kept and a body that is not JSON is kept as
//! text.

use crate::http::{FilePart, HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::response::{ApiResponse, ResponseBody};
use crate::types::{AuthKey, Credentials, Filter, PetFields, PetPhoto};

/// Request builder for the PetFriends API.
#[derive(Debug, Clone)]
pub struct PetFriendsClient {
    base_url: String,
}

impl PetFriendsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/key` with the credentials as headers.
    pub fn build_get_api_key(&self, credentials: &Credentials) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/api/key", self.base_url),
            headers: vec![
                ("email".to_string(), credentials.email.clone()),
                ("password".to_string(), credentials.password.clone()),
            ],
            body: None,
        }
    }

    /// `GET /api/pets?filter=...`. The filter is always sent, even when empty.
    pub fn build_list_pets(&self, auth_key: &AuthKey, filter: Filter) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/api/pets?filter={}", self.base_url, urlencoding::encode(filter.as_str())),
            headers: vec![auth_header(auth_key)],
            body: None,
        }
    }

    /// `POST /api/pets` as multipart with the photo file.
    pub fn build_add_pet(&self, auth_key: &AuthKey, fields: &PetFields, photo: &PetPhoto) -> HttpRequest {
        self.multipart_request(auth_key, format!("{}/api/pets", self.base_url), fields.form_pairs(), photo)
    }

    /// `POST /api/create_pet_simple` as a url-encoded form.
    pub fn build_add_pet_without_photo(&self, auth_key: &AuthKey, fields: &PetFields) -> HttpRequest {
        self.form_request(
            HttpMethod::Post,
            auth_key,
            format!("{}/api/create_pet_simple", self.base_url),
            fields,
        )
    }

    pub fn build_delete_pet(&self, auth_key: &AuthKey, pet_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.pet_url("api/pets", pet_id),
            headers: vec![auth_header(auth_key)],
            body: None,
        }
    }

    /// `PUT /api/pets/{id}` as a url-encoded form.
    pub fn build_update_pet(&self, auth_key: &AuthKey, pet_id: &str, fields: &PetFields) -> HttpRequest {
        self.form_request(HttpMethod::Put, auth_key, self.pet_url("api/pets", pet_id), fields)
    }

    /// `POST /api/pets/set_photo/{id}` as multipart with only the photo.
    pub fn build_add_photo_to_pet(&self, auth_key: &AuthKey, pet_id: &str, photo: &PetPhoto) -> HttpRequest {
        self.multipart_request(auth_key, self.pet_url("api/pets/set_photo", pet_id), Vec::new(), photo)
    }

    /// Normalize any response into `(status, body)`.
    pub fn parse(&self, response: HttpResponse) -> ApiResponse {
        ApiResponse {
            status: response.status,
            body: ResponseBody::from_text(response.body),
        }
    }

    /// `{base}/{prefix}/{pet_id}` with the id encoded as one path segment.
    fn pet_url(&self, prefix: &str, pet_id: &str) -> String {
        format!("{}/{prefix}/{}", self.base_url, urlencoding::encode(pet_id))
    }

    fn form_request(&self, method: HttpMethod, auth_key: &AuthKey, url: String, fields: &PetFields) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![auth_header(auth_key)],
            body: Some(RequestBody::Form(owned_pairs(fields.form_pairs()))),
        }
    }

    fn multipart_request(
        &self,
        auth_key: &AuthKey,
        url: String,
        fields: Vec<(&'static str, &str)>,
        photo: &PetPhoto,
    ) -> HttpRequest {
        let file = FilePart {
            name: "pet_photo".to_string(),
            file_name: photo.file_name.clone(),
            content_type: photo.content_type.to_string(),
            bytes: photo.bytes.clone(),
        };
        HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![auth_header(auth_key)],
            body: Some(RequestBody::Multipart {
                fields: owned_pairs(fields),
                file,
            }),
        }
    }
}

fn owned_pairs(pairs: Vec<(&'static str, &str)>) -> Vec<(String, String)> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn auth_header(auth_key: &AuthKey) -> (String, String) {
    ("auth_key".to_string(), auth_key.key.clone())
}
