//! Append-only text log of every API call.
//!
//! Each call produces two lines: the invocation with its arguments grouped by
//! where they travel in the request, and the outcome with status and body.
//! When the calling thread differs from the previous logged call a header
//! line naming it is written first. The test harness names threads after the
//! running test, so the log reads as one section per test.
//!
//! Inline photos (`data:image/...;base64,...`) are cut short in the logged
//! copy of the body. Write failures are reported through `tracing` and never
//! affect the call.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::response::{ApiResponse, ResponseBody};

const PHOTO_PREFIX: &str = "data:image";
const PHOTO_KEEP_CHARS: usize = 30;

/// Where an argument is placed in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParamKind {
    Header,
    Path,
    Query,
    FormData,
}

impl ParamKind {
    pub const ALL: [ParamKind; 4] = [ParamKind::Header, ParamKind::Path, ParamKind::Query, ParamKind::FormData];

    /// Category of a named argument, `None` for names no endpoint uses.
    pub fn of(name: &str) -> Option<Self> {
        match name {
            "auth_key" | "email" | "password" => Some(ParamKind::Header),
            "pet_id" => Some(ParamKind::Path),
            "filter" => Some(ParamKind::Query),
            "name" | "animal_type" | "age" | "pet_photo" => Some(ParamKind::FormData),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamKind::Header => "header",
            ParamKind::Path => "path",
            ParamKind::Query => "query",
            ParamKind::FormData => "formData",
        }
    }
}

/// Named argument values of one call, in call order.
pub type CallArgs = Vec<(&'static str, String)>;

/// File-backed call log shared by all operations of a `PetFriends` client.
#[derive(Debug)]
pub struct CallLog {
    path: PathBuf,
    last_caller: Mutex<Option<String>>,
}

impl CallLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_caller: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log `operation` with `args`, run `call`, then log its outcome.
    pub fn record<F>(&self, operation: &str, args: &[(&'static str, String)], call: F) -> Result<ApiResponse, ApiError>
    where
        F: FnOnce() -> Result<ApiResponse, ApiError>,
    {
        let mut lines = String::new();
        let caller = current_caller();
        if self.caller_changed(&caller) {
            lines.push_str(&format!("{} {caller} ->\n", timestamp()));
        }
        lines.push_str(&format!("{} {operation} ({})\n", timestamp(), signature(args)));
        self.append(&lines);

        let result = call();

        let outcome = match &result {
            Ok(response) => format!(
                "{} {operation} : status {}, body {}\n",
                timestamp(),
                response.status,
                redacted(&response.body)
            ),
            Err(e) => format!("{} {operation} : error {e}\n", timestamp()),
        };
        self.append(&outcome);

        result
    }

    fn caller_changed(&self, caller: &str) -> bool {
        let mut last = match self.last_caller.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if last.as_deref() == Some(caller) {
            return false;
        }
        *last = Some(caller.to_string());
        true
    }

    fn append(&self, text: &str) {
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(text.as_bytes()));
        if let Err(e) = written {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write call log");
        }
    }
}

fn current_caller() -> String {
    std::thread::current().name().unwrap_or("main").to_string()
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// `PetFriends, header : k="v", ..., formData : ...` with empty groups left out.
pub fn signature(args: &[(&'static str, String)]) -> String {
    let mut parts = vec!["PetFriends".to_string()];
    for kind in ParamKind::ALL {
        let values: Vec<String> = args
            .iter()
            .filter(|(name, _)| ParamKind::of(name) == Some(kind))
            .map(|(name, value)| format!("{name}={value:?}"))
            .collect();
        if !values.is_empty() {
            parts.push(format!("{} : {}", kind.label(), values.join(", ")));
        }
    }
    parts.join(", ")
}

/// Body text for the log with inline photos shortened.
pub fn redacted(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Json(Value::Object(map)) => {
            let mut map = map.clone();
            match map.get_mut("pets") {
                Some(Value::Array(pets)) => {
                    for pet in pets.iter_mut() {
                        if let Value::Object(pet) = pet {
                            cut_photos(pet);
                        }
                    }
                }
                Some(_) => {}
                None => cut_photos(&mut map),
            }
            Value::Object(map).to_string()
        }
        other => other.to_string(),
    }
}

fn cut_photos(object: &mut Map<String, Value>) {
    for value in object.values_mut() {
        if let Value::String(text) = value {
            if text.starts_with(PHOTO_PREFIX) {
                let short: String = text.chars().take(PHOTO_KEEP_CHARS).collect();
                *text = format!("{short} ...");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PHOTO: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQEASABIAAD";

    fn ok(body: Value) -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse {
            status: 200,
            body: ResponseBody::Json(body),
        })
    }

    #[test]
    fn signature_groups_arguments_by_location() {
        let args: CallArgs = vec![
            ("auth_key", "k".to_string()),
            ("pet_id", "42".to_string()),
            ("name", "Rex".to_string()),
            ("age", "4".to_string()),
        ];
        assert_eq!(
            signature(&args),
            r#"PetFriends, header : auth_key="k", path : pet_id="42", formData : name="Rex", age="4""#
        );
    }

    #[test]
    fn signature_without_arguments() {
        assert_eq!(signature(&[]), "PetFriends");
    }

    #[test]
    fn photos_in_a_single_pet_are_cut() {
        let body = ResponseBody::Json(json!({"id": "1", "pet_photo": PHOTO}));
        let logged = redacted(&body);
        assert!(logged.contains("\"pet_photo\":\"data:image/jpeg;base64,/9j/4AA ...\""));
        assert!(!logged.contains("SkZJRg"));
    }

    #[test]
    fn photos_in_a_listing_are_cut() {
        let body = ResponseBody::Json(json!({"pets": [
            {"id": "1", "pet_photo": PHOTO},
            {"id": "2", "pet_photo": ""},
        ]}));
        let logged = redacted(&body);
        assert!(logged.contains("/9j/4AA ..."));
        assert!(logged.contains("\"pet_photo\":\"\""));
    }

    #[test]
    fn text_bodies_are_logged_verbatim() {
        assert_eq!(redacted(&ResponseBody::Text(String::new())), "\"\"");
    }

    #[test]
    fn record_writes_call_and_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::new(dir.path().join("log.txt"));

        let body = json!({"id": "1", "pet_photo": PHOTO});
        let result = log
            .record("add_photo_to_pet", &[("pet_id", "1".to_string())], || ok(body.clone()))
            .unwrap();
        // The caller gets the body untouched.
        assert_eq!(result.body, ResponseBody::Json(body));

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" ->"));
        assert!(lines[1].ends_with(r#"add_photo_to_pet (PetFriends, path : pet_id="1")"#));
        assert!(lines[2].contains("add_photo_to_pet : status 200, body "));
        assert!(lines[2].contains(" ..."));
    }

    #[test]
    fn caller_header_is_written_once_per_caller() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::new(dir.path().join("log.txt"));

        log.record("list_pets", &[], || ok(json!({"pets": []}))).unwrap();
        log.record("list_pets", &[], || ok(json!({"pets": []}))).unwrap();

        let path = log.path().to_path_buf();
        let log = std::sync::Arc::new(log);
        let other = std::sync::Arc::clone(&log);
        std::thread::Builder::new()
            .name("another_test".to_string())
            .spawn(move || other.record("list_pets", &[], || ok(json!({"pets": []}))).unwrap())
            .unwrap()
            .join()
            .unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        let headers: Vec<&str> = text.lines().filter(|l| l.ends_with(" ->")).collect();
        assert_eq!(headers.len(), 2);
        assert!(headers[1].ends_with(" another_test ->"));
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn errors_are_logged_and_returned() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::new(dir.path().join("log.txt"));

        let err = log
            .record("add_pet", &[("pet_photo", "nope.jpg".to_string())], || {
                Err(ApiError::Photo {
                    path: "nope.jpg".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Photo { .. }));

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("add_pet : error cannot read photo nope.jpg"));
    }

    #[test]
    fn unwritable_log_does_not_fail_the_call() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::new(dir.path().join("missing").join("log.txt"));
        let result = log.record("list_pets", &[], || ok(json!({"pets": []})));
        assert_eq!(result.unwrap().status, 200);
    }
}
