//! Domain DTOs for the book catalog API.
//!
//! # Design
//! Field names follow the backend's JSON (`_id`, `totalPages`, `createdAt`)
//! through serde attributes so the Rust side keeps snake_case. The page count
//! is decoded leniently because the backend stores whatever the form sent;
//! on the way out it is always a plain unsigned integer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single book record returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Backend-assigned identifier; absent until the book has been created.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce_page_count")]
    pub total_pages: u32,
}

impl Book {
    /// The identifier, if the backend assigned a non-empty one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn form_data(&self) -> BookFormData {
        BookFormData::from(self)
    }
}

/// Mutable subset of [`Book`] sent by create and update requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookFormData {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    #[serde(deserialize_with = "coerce_page_count")]
    pub total_pages: u32,
}

impl From<&Book> for BookFormData {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            description: book.description.clone(),
            total_pages: book.total_pages,
        }
    }
}

/// Profile of the signed-in user. Read-only from the client's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer credential.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Request payload for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Inner payload of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: AuthToken,
}

/// Query parameters for `GET /books`.
///
/// Values are passed through untouched; an empty `genre` is still sent as
/// `genre=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl BookQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Success wrapper around every payload the backend returns.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Field-level validation messages attached to an error response. Fields
/// the client does not name are kept in `other`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Typed view over an error payload: `{message, errors?, ...}`.
///
/// The payload itself travels untouched in
/// [`ApiError::payload`](crate::error::ApiError::payload); this view only
/// reads it. Keys outside `message` and `errors` land in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// The sentinel used whenever no backend payload is available.
    pub fn network() -> Self {
        Self::new(NETWORK_ERROR_MESSAGE)
    }

    /// Read any JSON payload leniently. A bare string becomes the message;
    /// a `{data: {message}}` wrapper lends its inner message.
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        if let Some(message) = payload.as_str() {
            return Self::new(message);
        }
        let mut body: ErrorBody = serde_json::from_value(payload.clone()).unwrap_or_default();
        if body.message.is_empty() {
            if let Some(message) = payload.pointer("/data/message").and_then(|m| m.as_str()) {
                body.message = message.to_string();
            }
        }
        body
    }

    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "message": self.message }))
    }
}

/// Coerce free text into a page count the way a numeric form field does:
/// leading digits are kept, anything else yields 0, negatives clamp to 0.
pub fn parse_page_count(text: &str) -> u32 {
    let trimmed = text.trim_start();
    if trimmed.starts_with('-') {
        return 0;
    }
    let digits: String = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits
        .parse::<u64>()
        .map(|n| n.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(u32::MAX)
}

fn coerce_page_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                n.min(u64::from(u32::MAX)) as u32
            } else if let Some(f) = n.as_f64() {
                // `as` saturates and maps NaN to 0.
                f.trunc() as u32
            } else {
                0
            }
        }
        serde_json::Value::String(s) => parse_page_count(&s),
        serde_json::Value::Null => 0,
        other => {
            return Err(serde::de::Error::custom(format!(
                "totalPages must be a number, got {other}"
            )))
        }
    })
}
