//! Blocking API client for the PetFriends pet-management service.
//!
//! # Overview
//! `PetFriendsClient` builds `HttpRequest` values and normalizes
//! `HttpResponse` values without touching the network. `PetFriends` drives
//! it over a `Transport` (blocking `reqwest` by default), issuing exactly one
//! HTTP call per operation and recording each call in a `CallLog`.
//!
//! # Design
//! - Every operation returns `ApiResponse { status, body }`. 4xx/5xx
//!   statuses are data for the caller to assert on; bodies that are not JSON
//!   are kept as text.
//! - `ApiError` is reserved for calls that produced no response: an
//!   unreadable photo or a transport failure.
//! - The call log is the only state shared between calls, and it is only
//!   used to group log lines by caller.

pub mod api;
pub mod call_log;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod response;
pub mod types;

pub use api::PetFriends;
pub use call_log::CallLog;
pub use client::PetFriendsClient;
pub use config::Settings;
pub use error::{ApiError, ConfigError};
pub use http::{FilePart, HttpMethod, HttpRequest, HttpResponse, RequestBody, ReqwestTransport, Transport};
pub use response::{ApiResponse, ResponseBody};
pub use types::{AuthKey, Credentials, Filter, Pet, PetFields, PetList, PetPhoto};
