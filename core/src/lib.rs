//! API client core for the BookTrack catalog service.
//!
//! # Overview
//! Two layers:
//! - [`BookClient`] builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO). The C ABI crate
//!   exposes this layer directly.
//! - [`BookApi`] runs those requests through a [`Transport`], attaching the
//!   bearer token from a [`CredentialStore`] on the way out.
//!
//! # Design
//! - Successful responses are unwrapped from their `{data: ...}` envelope;
//!   callers never see it.
//! - Every failure is an [`ApiError`]; [`ApiError::payload`] gives the
//!   normalized `{message, errors?}` value a screen displays.
//! - [`BookFilter`] and the [`state`] module are pure and do no I/O.

pub mod api;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod filter;
pub mod http;
pub mod state;
pub mod transport;
pub mod types;

pub use api::BookApi;
pub use client::BookClient;
pub use config::ClientConfig;
pub use credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ApiError, CredentialError, TransportError};
pub use filter::BookFilter;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use state::{BookField, BookFormState, BookListState, FormMode};
pub use transport::{Transport, UreqTransport};
pub use types::{AuthToken, Book, BookFormData, BookQuery, ErrorBody, FieldErrors, User};
