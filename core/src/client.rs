//! Stateless HTTP request builder and response parser for the book API.
//!
//! # Design
//! `BookClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. Token injection is not done here; it is
//! the interceptor's job in [`BookApi`](crate::api::BookApi) or the host's
//! job behind the C ABI.
//!
//! Every `parse_*` goes through [`unwrap_envelope`], the single place that
//! strips the `{data: ...}` wrapper and normalizes failures.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, APPLICATION_JSON, CONTENT_TYPE};
use crate::types::{
    AuthToken, Book, BookFormData, BookQuery, Envelope, LoginData, LoginRequest,
    RegisterRequest, User,
};

/// Synchronous, stateless client for the book API.
#[derive(Debug, Clone)]
pub struct BookClient {
    base_url: String,
}

impl BookClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_login(&self, username: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let input = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.json_request(HttpMethod::Post, "/auth/login", &input)
    }

    pub fn build_register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<HttpRequest, ApiError> {
        let input = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        };
        self.json_request(HttpMethod::Post, "/auth/register", &input)
    }

    pub fn build_fetch_profile(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/profile")
    }

    /// `GET /books`, with the query passed through as given.
    pub fn build_list_books(&self, query: Option<&BookQuery>) -> Result<HttpRequest, ApiError> {
        let mut req = self.request(HttpMethod::Get, "/books");
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|e| ApiError::SerializationError(e.to_string()))?;
            req.path = format!("{}?{encoded}", req.path);
        }
        Ok(req)
    }

    pub fn build_get_book(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let path = book_path(id)?;
        Ok(self.request(HttpMethod::Get, &path))
    }

    pub fn build_create_book(&self, input: &BookFormData) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/books", input)
    }

    pub fn build_update_book(
        &self,
        id: &str,
        input: &BookFormData,
    ) -> Result<HttpRequest, ApiError> {
        let path = book_path(id)?;
        self.json_request(HttpMethod::Put, &path, input)
    }

    pub fn build_delete_book(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let path = book_path(id)?;
        Ok(self.request(HttpMethod::Delete, &path))
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthToken, ApiError> {
        let data: LoginData = unwrap_envelope(response)?;
        Ok(data.token)
    }

    /// The register payload is not used by the client, so it stays untyped.
    pub fn parse_register(&self, response: HttpResponse) -> Result<serde_json::Value, ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        let value: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        Ok(value.get("data").cloned().unwrap_or(serde_json::Value::Null))
    }

    pub fn parse_fetch_profile(&self, response: HttpResponse) -> Result<User, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_list_books(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_get_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_create_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_update_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        unwrap_envelope(response)
    }

    /// Any 2xx counts, with or without a body.
    pub fn parse_delete_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut req = self.request(method, path);
        req.body = Some(body);
        Ok(req)
    }
}

fn book_path(id: &str) -> Result<String, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::MissingBookId);
    }
    Ok(format!("/books/{}", urlencoding::encode(id)))
}

/// Strip the `{data: ...}` envelope from a successful response.
pub fn unwrap_envelope<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    let envelope: Envelope<T> = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    Ok(envelope.data)
}

/// Map non-2xx responses to `Backend` when the body is JSON, keeping it
/// as-is, and to `Network` otherwise (empty, `null` or not JSON).
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(body) if !body.is_null() => Err(ApiError::Backend {
            status: response.status,
            body,
        }),
        _ => Err(ApiError::Network {
            status: Some(response.status),
            detail: response.body.clone(),
        }),
    }
}
