//! Domain types for the PetFriends API.
//!
//! # Design
//! Outgoing values (`Credentials`, `PetFields`, `PetPhoto`) are plain inputs
//! the builder serializes. Incoming data stays as `serde_json::Value` inside
//! `ApiResponse`; `Pet` and `PetList` are opt-in read views for tests.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Login pair sent to `GET /api/key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Opaque token issued by the service, sent back in the `auth_key` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthKey {
    pub key: String,
}

impl AuthKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Value of the `filter` query parameter on `GET /api/pets`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    /// Every pet on the service.
    #[default]
    All,
    /// Only pets owned by the key's account.
    MyPets,
}

impl Filter {
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "",
            Filter::MyPets => "my_pets",
        }
    }
}

/// Text fields of a pet as sent in a form body.
///
/// `age` is a string on the wire; `None` leaves the field out entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetFields {
    pub name: String,
    pub animal_type: String,
    pub age: Option<String>,
}

impl PetFields {
    pub fn new(name: impl Into<String>, animal_type: impl Into<String>, age: impl ToString) -> Self {
        Self {
            name: name.into(),
            animal_type: animal_type.into(),
            age: Some(age.to_string()),
        }
    }

    /// Fields in form order, skipping an absent age.
    pub fn form_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("name", self.name.as_str()), ("animal_type", self.animal_type.as_str())];
        if let Some(age) = &self.age {
            pairs.push(("age", age.as_str()));
        }
        pairs
    }
}

/// Image file to upload as the `pet_photo` multipart part.
#[derive(Clone, PartialEq, Eq)]
pub struct PetPhoto {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl PetPhoto {
    /// Read the whole file. The handle is closed before this returns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ApiError::Photo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(path, bytes))
    }

    pub fn from_bytes(path: impl AsRef<Path>, bytes: Vec<u8>) -> Self {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());
        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
            _ => "image/jpeg",
        };
        Self {
            path: path.to_path_buf(),
            file_name,
            content_type,
            bytes,
        }
    }
}

impl fmt::Debug for PetPhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetPhoto")
            .field("path", &self.path)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A pet record as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub pet_photo: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Body of `GET /api/pets`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PetList {
    pub pets: Vec<Pet>,
}
