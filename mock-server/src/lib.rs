//! In-memory fake of the BookTrack backend.
//!
//! Speaks the same JSON as the real service: successes are wrapped in
//! `{data: ...}`, failures are `{message, errors?}`. Books belong to the user
//! who created them; `/profile` and every `/books` route need a bearer token
//! obtained from `/auth/login`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub total_pages: u32,
    #[serde(skip)]
    pub owner_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub total_pages: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub genre: Option<String>,
    pub author: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl FieldErrors {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Error responses, rendered as `{message, errors?}`.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("Username already exists")]
    Conflict,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Book not found")]
    BookNotFound,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match &self {
            MockError::Validation { .. } => StatusCode::BAD_REQUEST,
            MockError::Conflict => StatusCode::CONFLICT,
            MockError::InvalidCredentials | MockError::Unauthorized => StatusCode::UNAUTHORIZED,
            MockError::BookNotFound => StatusCode::NOT_FOUND,
        };
        let errors = match &self {
            MockError::Validation { errors, .. } if !errors.is_empty() => Some(errors),
            _ => None,
        };
        let body = ErrorBody {
            message: self.to_string(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
pub struct Store {
    accounts: Vec<Account>,
    sessions: HashMap<String, String>,
    books: Vec<Book>,
}

pub type Db = Arc<RwLock<Store>>;

/// User id resolved from the `Authorization: Bearer` header.
pub struct CurrentUser(pub String);

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = MockError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(MockError::Unauthorized)?;
        let store = db.read().await;
        store
            .sessions
            .get(token)
            .cloned()
            .map(CurrentUser)
            .ok_or(MockError::Unauthorized)
    }
}

pub fn app() -> Router {
    router(Db::default())
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/profile", get(profile))
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", get(get_book).put(update_book).delete(delete_book))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<Registration>,
) -> Result<(StatusCode, Json<Data<User>>), MockError> {
    let mut errors = FieldErrors::default();
    if input.username.trim().is_empty() {
        errors.username = Some("Username is required".to_string());
    }
    if input.password.len() < 6 {
        errors.password = Some("Password must be at least 6 characters".to_string());
    }
    if !input.email.contains('@') {
        errors.email = Some("Email is invalid".to_string());
    }
    if !errors.is_empty() {
        return Err(MockError::Validation {
            message: "Validation failed".to_string(),
            errors,
        });
    }

    let mut store = db.write().await;
    if store.accounts.iter().any(|a| a.user.username == input.username) {
        return Err(MockError::Conflict);
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: input.username,
        email: input.email,
        created_at: Utc::now(),
    };
    store.accounts.push(Account {
        user: user.clone(),
        password: input.password,
    });
    tracing::info!(user_id = %user.id, "registered user");
    Ok((StatusCode::CREATED, Json(Data { data: user })))
}

#[derive(Serialize)]
struct Token {
    token: String,
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<Data<Token>>, MockError> {
    let mut store = db.write().await;
    let user_id = store
        .accounts
        .iter()
        .find(|a| a.user.username == input.username && a.password == input.password)
        .map(|a| a.user.id.clone())
        .ok_or(MockError::InvalidCredentials)?;
    let token = Uuid::new_v4().simple().to_string();
    store.sessions.insert(token.clone(), user_id);
    Ok(Json(Data {
        data: Token { token },
    }))
}

async fn profile(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Data<User>>, MockError> {
    let store = db.read().await;
    store
        .accounts
        .iter()
        .find(|a| a.user.id == user_id)
        .map(|a| Json(Data { data: a.user.clone() }))
        .ok_or(MockError::Unauthorized)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

async fn list_books(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<ListParams>,
) -> Json<Data<Vec<Book>>> {
    let store = db.read().await;
    let matching = store.books.iter().filter(|b| {
        b.owner_id == user_id
            && params.genre.as_deref().is_none_or(|g| contains_ignore_case(&b.genre, g))
            && params.author.as_deref().is_none_or(|a| contains_ignore_case(&b.author, a))
    });
    let books = match params.limit {
        Some(limit) => {
            let page = params.page.unwrap_or(1).max(1);
            let offset = (page - 1).saturating_mul(limit);
            matching.skip(offset).take(limit).cloned().collect()
        }
        None => matching.cloned().collect(),
    };
    Json(Data { data: books })
}

fn validate_book(input: &BookInput) -> Result<(), MockError> {
    if input.title.trim().is_empty() {
        return Err(MockError::Validation {
            message: "Title is required".to_string(),
            errors: FieldErrors::default(),
        });
    }
    Ok(())
}

async fn create_book(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<BookInput>,
) -> Result<(StatusCode, Json<Data<Book>>), MockError> {
    validate_book(&input)?;
    let book = Book {
        id: Uuid::new_v4().simple().to_string(),
        title: input.title,
        author: input.author,
        genre: input.genre,
        description: input.description,
        total_pages: input.total_pages,
        owner_id: user_id,
    };
    db.write().await.books.push(book.clone());
    Ok((StatusCode::CREATED, Json(Data { data: book })))
}

async fn get_book(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Data<Book>>, MockError> {
    let store = db.read().await;
    store
        .books
        .iter()
        .find(|b| b.id == id && b.owner_id == user_id)
        .cloned()
        .map(|book| Json(Data { data: book }))
        .ok_or(MockError::BookNotFound)
}

async fn update_book(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<BookInput>,
) -> Result<Json<Data<Book>>, MockError> {
    validate_book(&input)?;
    let mut store = db.write().await;
    let book = store
        .books
        .iter_mut()
        .find(|b| b.id == id && b.owner_id == user_id)
        .ok_or(MockError::BookNotFound)?;
    book.title = input.title;
    book.author = input.author;
    book.genre = input.genre;
    book.description = input.description;
    book.total_pages = input.total_pages;
    Ok(Json(Data { data: book.clone() }))
}

async fn delete_book(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, MockError> {
    let mut store = db.write().await;
    let before = store.books.len();
    store.books.retain(|b| !(b.id == id && b.owner_id == user_id));
    if store.books.len() == before {
        return Err(MockError::BookNotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
