//! Async operations over a transport, with bearer-token injection.
//!
//! # Design
//! `BookApi` composes the sans-IO [`BookClient`] with two injected seams: a
//! [`CredentialStore`] read by the request interceptor, and a [`Transport`]
//! that performs the round-trip. Every operation goes through
//! [`BookApi::call`]: build, authorize, execute, parse. A store failure
//! during authorization rejects the request before anything is sent; a
//! transport failure becomes `ApiError::Network`; response status and
//! envelope handling belong to `BookClient`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::BookClient;
use crate::config::ClientConfig;
use crate::credential::CredentialStore;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, AUTHORIZATION};
use crate::transport::{Transport, UreqTransport};
use crate::types::{AuthToken, Book, BookFormData, BookQuery, User};

/// Shared, cloneable handle to the book API.
#[derive(Clone)]
pub struct BookApi {
    client: BookClient,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
}

impl BookApi {
    pub fn new(
        client: BookClient,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            client,
            credentials,
            transport,
        }
    }

    /// API over `ureq` using the configured endpoint and timeout.
    pub fn from_config(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::new(
            BookClient::new(&config.base_url),
            credentials,
            Arc::new(UreqTransport::new(config.timeout())),
        )
    }

    pub fn client(&self) -> &BookClient {
        &self.client
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Authenticate and store the returned token.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let token = self
            .call(self.client.build_login(username, password), BookClient::parse_login)
            .await?;
        self.credentials.set(token.clone()).await?;
        info!(username, "signed in");
        Ok(token)
    }

    /// Drop the stored token. No request is sent.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.credentials.clear().await?;
        info!("signed out");
        Ok(())
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<serde_json::Value, ApiError> {
        self.call(
            self.client.build_register(username, password, email),
            BookClient::parse_register,
        )
        .await
    }

    pub async fn fetch_user_profile(&self) -> Result<User, ApiError> {
        self.call(Ok(self.client.build_fetch_profile()), BookClient::parse_fetch_profile)
            .await
    }

    pub async fn fetch_books(&self, query: Option<&BookQuery>) -> Result<Vec<Book>, ApiError> {
        self.call(self.client.build_list_books(query), BookClient::parse_list_books)
            .await
    }

    pub async fn fetch_book_detail(&self, id: &str) -> Result<Book, ApiError> {
        self.call(self.client.build_get_book(id), BookClient::parse_get_book)
            .await
    }

    pub async fn create_book(&self, data: &BookFormData) -> Result<Book, ApiError> {
        self.call(self.client.build_create_book(data), BookClient::parse_create_book)
            .await
    }

    pub async fn update_book(&self, id: &str, data: &BookFormData) -> Result<Book, ApiError> {
        self.call(self.client.build_update_book(id, data), BookClient::parse_update_book)
            .await
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), ApiError> {
        self.call(self.client.build_delete_book(id), BookClient::parse_delete_book)
            .await
    }

    /// Request interceptor: attach `Authorization: Bearer <token>` when the
    /// store holds a token.
    async fn authorize(&self, mut request: HttpRequest) -> Result<HttpRequest, ApiError> {
        let token = self.credentials.get().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "credential lookup failed, request not sent");
            ApiError::from(e)
        })?;
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request.set_header(AUTHORIZATION, token.bearer());
        }
        Ok(request)
    }

    /// The one request pipeline every operation shares.
    async fn call<T>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: fn(&BookClient, HttpResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let request = self.authorize(request?).await?;
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, authenticated = request.header(AUTHORIZATION).is_some(), "sending request");

        let response = self.transport.execute(request).await.map_err(|e| {
            warn!(%method, %path, error = %e, "no response");
            ApiError::from(e)
        })?;
        let status = response.status;

        parse(&self.client, response).map_err(|e| {
            warn!(%method, %path, status, error = %e, "request failed");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::credential::MemoryCredentialStore;
    use crate::error::{CredentialError, TransportError};
    use crate::http::HttpMethod;
    use serde_json::json;

    /// Records every request and replies with a canned response.
    struct FakeTransport {
        reply: Mutex<Option<Result<HttpResponse, TransportError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                }))),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Err(TransportError("connection refused".to_string())))),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            self.reply
                .lock()
                .unwrap()
                .take()
                .expect("fake transport called more than once")
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn get(&self) -> Result<Option<AuthToken>, CredentialError> {
            Err(CredentialError::Unavailable("keychain locked".to_string()))
        }

        async fn set(&self, _token: AuthToken) -> Result<(), CredentialError> {
            Err(CredentialError::Unavailable("keychain locked".to_string()))
        }

        async fn clear(&self) -> Result<(), CredentialError> {
            Ok(())
        }
    }

    /// Reads fine, refuses writes.
    struct ReadOnlyStore;

    #[async_trait]
    impl CredentialStore for ReadOnlyStore {
        async fn get(&self) -> Result<Option<AuthToken>, CredentialError> {
            Ok(None)
        }

        async fn set(&self, _token: AuthToken) -> Result<(), CredentialError> {
            Err(CredentialError::Unavailable("read-only".to_string()))
        }

        async fn clear(&self) -> Result<(), CredentialError> {
            Ok(())
        }
    }

    fn api(store: Arc<dyn CredentialStore>, transport: Arc<FakeTransport>) -> BookApi {
        BookApi::new(BookClient::new("http://api.test"), store, transport)
    }

    fn form() -> BookFormData {
        BookFormData {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            genre: "SciFi".to_string(),
            description: "...".to_string(),
            total_pages: 412,
        }
    }

    #[tokio::test]
    async fn stored_token_is_attached_as_bearer() {
        let transport = FakeTransport::replying(200, r#"{"data":[]}"#);
        let store = Arc::new(MemoryCredentialStore::with_token(AuthToken::new("abc123")));
        api(store, transport.clone()).fetch_books(None).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("Authorization"), Some("Bearer abc123"));
    }

    #[tokio::test]
    async fn empty_store_sends_no_authorization_header() {
        let transport = FakeTransport::replying(200, r#"{"data":[]}"#);
        let store = Arc::new(MemoryCredentialStore::new());
        api(store, transport.clone()).fetch_books(None).await.unwrap();

        assert!(transport.requests()[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn store_failure_rejects_before_sending() {
        let transport = FakeTransport::replying(200, r#"{"data":[]}"#);
        let err = api(Arc::new(BrokenStore), transport.clone())
            .fetch_books(None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::CredentialStore(_)));
        assert_eq!(err.payload(), json!({"message": "Network error"}));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn fetch_book_detail_resolves_to_inner_book() {
        let body = r#"{"data":{"_id":"1","title":"Dune","author":"Herbert","genre":"SciFi","description":"...","totalPages":412}}"#;
        let transport = FakeTransport::replying(200, body);
        let book = api(Arc::new(MemoryCredentialStore::new()), transport.clone())
            .fetch_book_detail("1")
            .await
            .unwrap();

        assert_eq!(
            book,
            Book {
                id: Some("1".to_string()),
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                genre: "SciFi".to_string(),
                description: "...".to_string(),
                total_pages: 412,
            }
        );
        let sent = transport.requests();
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].path, "http://api.test/books/1");
    }

    #[tokio::test]
    async fn login_rejects_with_backend_payload() {
        let transport = FakeTransport::replying(401, r#"{"message":"Invalid credentials"}"#);
        let store = Arc::new(MemoryCredentialStore::new());
        let err = api(store.clone(), transport)
            .login("ana", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.payload(), json!({"message": "Invalid credentials"}));
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_stores_token_and_logout_clears_it() {
        let transport = FakeTransport::replying(200, r#"{"data":{"token":"abc123"}}"#);
        let store = Arc::new(MemoryCredentialStore::new());
        let api = api(store.clone(), transport);

        let token = api.login("ana", "secret").await.unwrap();
        assert_eq!(token.as_str(), "abc123");
        assert_eq!(store.get().await.unwrap(), Some(token));

        api.logout().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_with_unreadable_store_sends_nothing() {
        let transport = FakeTransport::replying(200, r#"{"data":{"token":"abc123"}}"#);
        let err = api(Arc::new(BrokenStore), transport.clone())
            .login("ana", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::CredentialStore(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn login_fails_when_token_cannot_be_stored() {
        let transport = FakeTransport::replying(200, r#"{"data":{"token":"abc123"}}"#);
        let err = api(Arc::new(ReadOnlyStore), transport.clone())
            .login("ana", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::CredentialStore(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn create_book_transport_failure_is_network_error() {
        let err = api(Arc::new(MemoryCredentialStore::new()), FakeTransport::unreachable())
            .create_book(&form())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Network { status: None, .. }));
        assert_eq!(err.payload(), json!({"message": "Network error"}));
    }

    #[tokio::test]
    async fn update_with_empty_id_sends_nothing() {
        let transport = FakeTransport::replying(200, "{}");
        let err = api(Arc::new(MemoryCredentialStore::new()), transport.clone())
            .update_book("", &form())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::MissingBookId));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn every_operation_issues_exactly_one_request() {
        let cases: Vec<(&str, u16, &str)> = vec![
            ("register", 201, r#"{"data":{"id":"u1"}}"#),
            ("profile", 200, r#"{"data":{"id":"u1","username":"ana","email":"a@x","createdAt":"2024-01-01T00:00:00Z"}}"#),
            ("create", 201, r#"{"data":{"_id":"9","title":"Dune","author":"Herbert","genre":"SciFi","totalPages":412}}"#),
            ("update", 200, r#"{"data":{"_id":"9","title":"Dune","author":"Herbert","genre":"SciFi","totalPages":412}}"#),
            ("delete", 204, ""),
        ];
        for (op, status, body) in cases {
            let transport = FakeTransport::replying(status, body);
            let store = Arc::new(MemoryCredentialStore::with_token(AuthToken::new("t")));
            let api = api(store, transport.clone());
            match op {
                "register" => assert_eq!(
                    api.register("ana", "pw", "a@x").await.unwrap()["id"],
                    "u1"
                ),
                "profile" => assert_eq!(api.fetch_user_profile().await.unwrap().username, "ana"),
                "create" => assert_eq!(api.create_book(&form()).await.unwrap().id(), Some("9")),
                "update" => assert_eq!(api.update_book("9", &form()).await.unwrap().title, "Dune"),
                "delete" => api.delete_book("9").await.unwrap(),
                _ => unreachable!(),
            }
            let sent = transport.requests();
            assert_eq!(sent.len(), 1, "{op}");
            assert_eq!(sent[0].header("authorization"), Some("Bearer t"), "{op}");
        }
    }
}
