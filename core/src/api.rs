//! Executing PetFriends client: one blocking call per operation.
//!
//! # Design
//! `PetFriends` combines the stateless `PetFriendsClient` builder with a
//! `Transport` and an optional `CallLog`. Every operation follows the same
//! path: build the request, execute it once, normalize the response, and
//! record the call. HTTP error statuses come back as ordinary
//! `ApiResponse` values; `Err` only means no response was obtained.

use std::path::Path;

use crate::call_log::{CallArgs, CallLog};
use crate::client::PetFriendsClient;
use crate::config::Settings;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport, ReqwestTransport};
use crate::response::ApiResponse;
use crate::types::{AuthKey, Credentials, Filter, PetFields, PetPhoto};

/// API client for a PetFriends deployment.
#[derive(Debug)]
pub struct PetFriends<T = ReqwestTransport> {
    client: PetFriendsClient,
    transport: T,
    log: Option<CallLog>,
}

impl PetFriends<ReqwestTransport> {
    /// Client over `reqwest` logging to `log.txt` in the working directory.
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(base_url, ReqwestTransport::new()).with_call_log(CallLog::new("log.txt"))
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_transport(&settings.base_url, ReqwestTransport::new())
            .with_call_log(CallLog::new(&settings.log_file))
    }
}

impl<T: Transport> PetFriends<T> {
    /// Client over `transport` with no call log.
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            client: PetFriendsClient::new(base_url),
            transport,
            log: None,
        }
    }

    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn without_call_log(mut self) -> Self {
        self.log = None;
        self
    }

    pub fn call_log(&self) -> Option<&CallLog> {
        self.log.as_ref()
    }

    pub fn client(&self) -> &PetFriendsClient {
        &self.client
    }

    /// Request an auth key. A 200 body carries `{"key": "..."}`.
    pub fn get_api_key(&self, email: &str, password: &str) -> Result<ApiResponse, ApiError> {
        let args: CallArgs = vec![("email", email.to_string()), ("password", password.to_string())];
        self.call("get_api_key", args, || {
            Ok(self.client.build_get_api_key(&Credentials::new(email, password)))
        })
    }

    /// List all pets, or only the account's own with `Filter::MyPets`.
    pub fn list_pets(&self, auth_key: &AuthKey, filter: Filter) -> Result<ApiResponse, ApiError> {
        let args: CallArgs = vec![
            ("auth_key", auth_key.key.clone()),
            ("filter", filter.as_str().to_string()),
        ];
        self.call("list_pets", args, || Ok(self.client.build_list_pets(auth_key, filter)))
    }

    /// Create a pet with a photo read from `pet_photo`.
    pub fn add_pet(
        &self,
        auth_key: &AuthKey,
        name: &str,
        animal_type: &str,
        age: impl ToString,
        pet_photo: impl AsRef<Path>,
    ) -> Result<ApiResponse, ApiError> {
        let fields = PetFields::new(name, animal_type, age);
        let pet_photo = pet_photo.as_ref();
        let mut args = pet_args(auth_key, None, &fields);
        args.push(("pet_photo", pet_photo.display().to_string()));
        self.call("add_pet", args, || {
            let photo = PetPhoto::load(pet_photo)?;
            Ok(self.client.build_add_pet(auth_key, &fields, &photo))
        })
    }

    pub fn add_pet_without_photo(
        &self,
        auth_key: &AuthKey,
        name: &str,
        animal_type: &str,
        age: impl ToString,
    ) -> Result<ApiResponse, ApiError> {
        let fields = PetFields::new(name, animal_type, age);
        let args = pet_args(auth_key, None, &fields);
        self.call("add_pet_without_photo", args, || {
            Ok(self.client.build_add_pet_without_photo(auth_key, &fields))
        })
    }

    /// Delete a pet. The live service answers 200 with an empty body.
    pub fn delete_pet(&self, auth_key: &AuthKey, pet_id: &str) -> Result<ApiResponse, ApiError> {
        let args: CallArgs = vec![("auth_key", auth_key.key.clone()), ("pet_id", pet_id.to_string())];
        self.call("delete_pet", args, || Ok(self.client.build_delete_pet(auth_key, pet_id)))
    }

    pub fn update_pet(
        &self,
        auth_key: &AuthKey,
        pet_id: &str,
        name: &str,
        animal_type: &str,
        age: impl ToString,
    ) -> Result<ApiResponse, ApiError> {
        let fields = PetFields::new(name, animal_type, age);
        let args = pet_args(auth_key, Some(pet_id), &fields);
        self.call("update_pet", args, || Ok(self.client.build_update_pet(auth_key, pet_id, &fields)))
    }

    /// Replace the photo of an existing pet.
    pub fn add_photo_to_pet(
        &self,
        auth_key: &AuthKey,
        pet_id: &str,
        pet_photo: impl AsRef<Path>,
    ) -> Result<ApiResponse, ApiError> {
        let pet_photo = pet_photo.as_ref();
        let args: CallArgs = vec![
            ("auth_key", auth_key.key.clone()),
            ("pet_id", pet_id.to_string()),
            ("pet_photo", pet_photo.display().to_string()),
        ];
        self.call("add_photo_to_pet", args, || {
            let photo = PetPhoto::load(pet_photo)?;
            Ok(self.client.build_add_photo_to_pet(auth_key, pet_id, &photo))
        })
    }

    fn call<F>(&self, operation: &str, args: CallArgs, build: F) -> Result<ApiResponse, ApiError>
    where
        F: FnOnce() -> Result<HttpRequest, ApiError>,
    {
        let run = || -> Result<ApiResponse, ApiError> {
            let request = build()?;
            let response = self.transport.execute(request)?;
            Ok(self.client.parse(response))
        };
        match &self.log {
            Some(log) => log.record(operation, &args, run),
            None => run(),
        }
    }
}

fn pet_args(auth_key: &AuthKey, pet_id: Option<&str>, fields: &PetFields) -> CallArgs {
    let mut args: CallArgs = vec![("auth_key", auth_key.key.clone())];
    if let Some(pet_id) = pet_id {
        args.push(("pet_id", pet_id.to_string()));
    }
    args.extend(fields.form_pairs().into_iter().map(|(k, v)| (k, v.to_string())));
    args
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::response::ResponseBody;

    /// Answers every request with a canned response and keeps what it saw.
    struct CannedTransport {
        status: u16,
        body: &'static str,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for CannedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request);
            Ok(HttpResponse {
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }

    fn api(status: u16, body: &'static str) -> PetFriends<CannedTransport> {
        PetFriends::with_transport("http://pets.test/", CannedTransport::new(status, body))
    }

    #[test]
    fn each_operation_sends_exactly_one_request() {
        let api = api(200, r#"{"id":"p1"}"#);
        let key = AuthKey::new("k");

        api.get_api_key("a@b.c", "pw").unwrap();
        api.list_pets(&key, Filter::MyPets).unwrap();
        api.add_pet_without_photo(&key, "Rex", "dog", "4").unwrap();
        api.update_pet(&key, "p1", "Rex", "dog", 5).unwrap();
        api.delete_pet(&key, "p1").unwrap();

        let seen = api.transport.seen.borrow();
        let methods: Vec<(HttpMethod, &str)> = seen.iter().map(|r| (r.method, r.url.as_str())).collect();
        assert_eq!(
            methods,
            vec![
                (HttpMethod::Get, "http://pets.test/api/key"),
                (HttpMethod::Get, "http://pets.test/api/pets?filter=my_pets"),
                (HttpMethod::Post, "http://pets.test/api/create_pet_simple"),
                (HttpMethod::Put, "http://pets.test/api/pets/p1"),
                (HttpMethod::Delete, "http://pets.test/api/pets/p1"),
            ]
        );
    }

    #[test]
    fn error_statuses_are_returned_not_raised() {
        let api = api(403, "<html>Forbidden</html>");
        let response = api.get_api_key("nobody", "").unwrap();
        assert_eq!(response.status, 403);
        assert_eq!(response.body, ResponseBody::Text("<html>Forbidden</html>".to_string()));
    }

    #[test]
    fn missing_photo_fails_before_sending() {
        let api = api(200, "{}");
        let err = api
            .add_pet(&AuthKey::new("k"), "Rex", "dog", "4", "no/such/photo.jpg")
            .unwrap_err();
        assert!(matches!(err, ApiError::Photo { .. }));
        assert!(api.transport.seen.borrow().is_empty());
    }

    #[test]
    fn photo_upload_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("cat1.jpg");
        std::fs::write(&photo, b"\xff\xd8\xff\xe0jpeg").unwrap();

        let api = api(200, r#"{"id":"p1"}"#);
        let response = api.add_photo_to_pet(&AuthKey::new("k"), "p1", &photo).unwrap();
        assert_eq!(response.body.get("id").unwrap(), "p1");

        let seen = api.transport.seen.borrow();
        assert_eq!(seen[0].url, "http://pets.test/api/pets/set_photo/p1");
        let file = seen[0].body.as_ref().and_then(|b| b.file()).unwrap();
        assert_eq!(file.file_name, "cat1.jpg");
        assert_eq!(file.bytes, b"\xff\xd8\xff\xe0jpeg");
    }

    #[test]
    fn calls_are_logged_when_a_log_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let api = api(200, r#"{"key":"abc"}"#).with_call_log(CallLog::new(dir.path().join("log.txt")));

        api.get_api_key("a@b.c", "pw").unwrap();

        let text = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert!(text.contains(r#"get_api_key (PetFriends, header : email="a@b.c", password="pw")"#));
        assert!(text.contains(r#"get_api_key : status 200, body {"key":"abc"}"#));
    }

    #[test]
    fn pet_args_follow_form_order() {
        let args = pet_args(&AuthKey::new("k"), Some("p1"), &PetFields::new("Rex", "dog", 4));
        let names: Vec<&str> = args.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["auth_key", "pet_id", "name", "animal_type", "age"]);
    }
}
