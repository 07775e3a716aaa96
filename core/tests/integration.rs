//! Full catalog lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every `BookApi`
//! operation over real HTTP through `UreqTransport`. Validates request
//! building, token injection, envelope unwrapping and error normalization
//! end-to-end.

use std::sync::Arc;

use serde_json::json;

use booktrack_core::{
    ApiError, BookApi, BookField, BookFilter, BookFormData, BookFormState, BookListState,
    BookQuery, ClientConfig, CredentialStore, FileCredentialStore,
    MemoryCredentialStore,
};

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_server::run(listener).await });
    format!("http://{addr}")
}

fn config(base_url: String) -> ClientConfig {
    ClientConfig {
        base_url,
        timeout_ms: 5000,
    }
}

fn form(title: &str, genre: &str, author: &str, pages: u32) -> BookFormData {
    BookFormData {
        title: title.to_string(),
        author: author.to_string(),
        genre: genre.to_string(),
        description: format!("{title} by {author}"),
        total_pages: pages,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn catalog_lifecycle() {
    let base_url = start_server().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let api = BookApi::from_config(&config(base_url), store.clone());

    // Step 1: unauthenticated list is rejected by the backend.
    let err = api.fetch_books(None).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.payload(), json!({"message": "Unauthorized"}));

    // Step 2: register, then bad and good logins.
    api.register("ana", "secret1", "ana@example.com").await.unwrap();
    let err = api.login("ana", "wrong-password").await.unwrap_err();
    assert_eq!(err.payload(), json!({"message": "Invalid credentials"}));
    assert!(store.get().await.unwrap().is_none());

    let token = api.login("ana", "secret1").await.unwrap();
    assert_eq!(store.get().await.unwrap(), Some(token));

    // Step 3: profile.
    let user = api.fetch_user_profile().await.unwrap();
    assert_eq!(user.username, "ana");
    assert_eq!(user.email, "ana@example.com");

    // Step 4: create through the form state.
    let created = BookFormState::create()
        .with_field(BookField::Title, "Dune")
        .with_field(BookField::Author, "Frank Herbert")
        .with_field(BookField::Genre, "SciFi")
        .with_field(BookField::Description, "Spice")
        .with_field(BookField::TotalPages, "412")
        .submit(&api)
        .await
        .unwrap();
    let dune_id = created.id().unwrap().to_string();
    assert_eq!(created.total_pages, 412);

    api.create_book(&form("Emma", "Romance", "Jane Austen", 474))
        .await
        .unwrap();
    api.create_book(&form("Foundation", "Science Fiction", "Isaac Asimov", 255))
        .await
        .unwrap();

    // Step 5: detail returns the inner book.
    let fetched = api.fetch_book_detail(&dune_id).await.unwrap();
    assert_eq!(fetched, created);

    // Step 6: edit through the form state.
    let updated = BookFormState::from_book(&fetched)
        .unwrap()
        .with_field(BookField::Title, "Dune (1965)")
        .submit(&api)
        .await
        .unwrap();
    assert_eq!(updated.title, "Dune (1965)");
    assert_eq!(updated.id(), Some(dune_id.as_str()));

    // Step 7: server-side search, then client-side filter on top.
    let state = BookListState::new().with_filter(BookFilter::new("dune", "sci", ""));
    let results = api.fetch_books(Some(&state.search_query())).await.unwrap();
    assert_eq!(results.len(), 2);
    let state = state.with_books(results);
    let visible = state.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id(), Some(dune_id.as_str()));

    // Step 8: pagination is passed through.
    let page = api
        .fetch_books(Some(&BookQuery::new().limit(2).page(2)))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "Foundation");

    // Step 9: delete, then the list no longer has it.
    api.delete_book(&dune_id).await.unwrap();
    let books = api.fetch_books(None).await.unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|b| b.id() != Some(dune_id.as_str())));

    // Step 10: deleted book is gone.
    let err = api.fetch_book_detail(&dune_id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message(), "Book not found");
    let err = api.delete_book(&dune_id).await.unwrap_err();
    assert!(err.is_not_found());

    // Step 11: logout drops the token; the backend rejects again.
    api.logout().await.unwrap();
    let err = api.fetch_user_profile().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_registration_surfaces_field_errors() {
    let base_url = start_server().await;
    let api = BookApi::from_config(&config(base_url), Arc::new(MemoryCredentialStore::new()));

    let err = api.register("", "1", "nope").await.unwrap_err();
    let body = err.body();
    assert_eq!(body.message, "Validation failed");
    let errors = body.errors.unwrap();
    assert_eq!(errors.username.as_deref(), Some("Username is required"));
    assert!(errors.password.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_survives_restart_with_file_store() {
    let base_url = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");

    let api = BookApi::from_config(&config(base_url.clone()), Arc::new(FileCredentialStore::new(&path)));
    api.register("ana", "secret1", "ana@example.com").await.unwrap();
    api.login("ana", "secret1").await.unwrap();

    // A fresh API over the same file picks the token up.
    let reopened = BookApi::from_config(&config(base_url), Arc::new(FileCredentialStore::new(&path)));
    assert_eq!(reopened.fetch_user_profile().await.unwrap().username, "ana");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_backend_is_network_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let api = BookApi::from_config(
        &config(format!("http://127.0.0.1:{port}")),
        Arc::new(MemoryCredentialStore::new()),
    );

    let err = api
        .create_book(&form("Dune", "SciFi", "Herbert", 412))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network { status: None, .. }));
    assert_eq!(err.payload(), json!({"message": "Network error"}));
}
