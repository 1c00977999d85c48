//! Bazaar Test Utilities
//!
//! Shared test infrastructure for the Bazaar workspace:
//! - Scripted mocks for the transport, refresher and product fetcher seams
//! - Proptest generators for identifiers, paths, tokens and products
//! - Fixtures for signed-in sessions and test configuration

pub use bazaar_cache::{CacheConfig, CacheRead, ProductCache, ProductFetcher};
pub use bazaar_client::{
    ApiRequest, ApiResponse, AuthClient, ClientError, ClientResult, HttpTransport,
    MemoryNavigator, Navigator, RefreshError, RefreshedTokens, SessionStore, TokenRefresher,
};
pub use bazaar_core::{
    ClientConfig, FetchError, ManualClock, Product, ProductId, Role, SessionCredentials,
    UserRecord,
};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// Transport that replays queued responses in order and records every request.
///
/// An exhausted queue fails the request with [`ClientError::Transport`].
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = ApiResponse>) -> Self {
        let transport = Self::new();
        for response in responses {
            transport.push(response);
        }
        transport
    }

    pub fn push(&self, response: ApiResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        let status = reqwest::StatusCode::from_u16(status).unwrap_or(reqwest::StatusCode::OK);
        self.push(ApiResponse::json_body(status, &body));
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| ClientError::Transport(format!("no scripted response for {}", request.path)))
    }
}

// ============================================================================
// MOCK REFRESHER
// ============================================================================

/// Refresher with a fixed outcome that counts its calls.
#[derive(Debug)]
pub struct MockRefresher {
    outcome: Option<RefreshedTokens>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockRefresher {
    /// Every refresh succeeds with `access_token`.
    pub fn succeeding(access_token: impl Into<String>) -> Self {
        Self::with_outcome(Some(RefreshedTokens {
            access_token: access_token.into(),
            refresh_token: None,
        }))
    }

    /// Every refresh succeeds and rotates the refresh token.
    pub fn rotating(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self::with_outcome(Some(RefreshedTokens {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
        }))
    }

    /// Every refresh is rejected with a 401.
    pub fn failing() -> Self {
        Self::with_outcome(None)
    }

    fn with_outcome(outcome: Option<RefreshedTokens>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens presented, oldest first.
    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TokenRefresher for MockRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(refresh_token.to_string());
        self.outcome.clone().ok_or_else(|| RefreshError::Rejected {
            status: 401,
            message: "refresh token expired".to_string(),
        })
    }
}

// ============================================================================
// MOCK PRODUCT FETCHER
// ============================================================================

/// Fetcher over an in-memory catalog.
///
/// The catalog can be swapped between calls to tell fresh data from cached
/// data, and a single failure can be armed with [`fail_next`](Self::fail_next).
#[derive(Debug, Default)]
pub struct MockProductFetcher {
    catalog: Mutex<Vec<Product>>,
    fail_next: Mutex<Option<FetchError>>,
    list_calls: AtomicUsize,
    by_id_calls: AtomicUsize,
}

impl MockProductFetcher {
    pub fn new(catalog: Vec<Product>) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            ..Self::default()
        }
    }

    pub fn set_catalog(&self, catalog: Vec<Product>) {
        *self.catalog.lock().unwrap_or_else(PoisonError::into_inner) = catalog;
    }

    /// Make the next fetch of either kind fail with `error`.
    pub fn fail_next(&self, error: FetchError) {
        *self.fail_next.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn by_id_calls(&self) -> usize {
        self.by_id_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Option<FetchError> {
        self.fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[async_trait]
impl ProductFetcher for MockProductFetcher {
    async fn fetch_all(&self) -> Result<Vec<Product>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(self
            .catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn fetch_by_id(&self, id: &ProductId) -> Result<Product, FetchError> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| FetchError::with_status(404, "Product not found"))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Bazaar types.

    use super::*;
    use proptest::prelude::*;

    /// Product IDs in the two shapes the backend sends: numeric and hex object IDs.
    pub fn arb_product_id() -> impl Strategy<Value = ProductId> {
        prop_oneof![
            (1u64..1_000_000).prop_map(ProductId::from),
            "[0-9a-f]{24}".prop_map(ProductId::from),
        ]
    }

    pub fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::User), Just(Role::Seller), Just(Role::Admin)]
    }

    /// Opaque token text. Header-safe characters only.
    pub fn arb_token() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_\\-\\.]{8,64}"
    }

    /// A path matching one of the default public endpoints.
    pub fn arb_public_path() -> impl Strategy<Value = String> {
        let base = prop_oneof![
            Just("/products"),
            Just("/categories"),
            Just("/auth/login"),
            Just("/sellers"),
        ];
        (base, proptest::option::of("[a-z0-9]{1,12}")).prop_map(|(base, tail)| match tail {
            Some(tail) => format!("{}/{}", base, tail),
            None => base.to_string(),
        })
    }

    /// A path matching none of the default public endpoints.
    pub fn arb_protected_path() -> impl Strategy<Value = String> {
        let base = prop_oneof![
            Just("/orders"),
            Just("/cart"),
            Just("/wishlist"),
            Just("/users/me"),
            Just("/reviews"),
        ];
        (base, proptest::option::of("[0-9]{1,6}")).prop_map(|(base, tail)| match tail {
            Some(tail) => format!("{}/{}", base, tail),
            None => base.to_string(),
        })
    }

    pub fn arb_product() -> impl Strategy<Value = Product> {
        (arb_product_id(), "[A-Z][a-z]{2,12}( [A-Z][a-z]{2,12})?", 1u32..100_000).prop_map(
            |(id, name, cents)| {
                Product::new(id)
                    .with_field("name", serde_json::json!(name))
                    .with_field("price", serde_json::json!(cents as f64 / 100.0))
            },
        )
    }

    /// Catalog with unique product IDs.
    pub fn arb_catalog(max_len: usize) -> impl Strategy<Value = Vec<Product>> {
        proptest::collection::vec(arb_product(), 1..=max_len.max(1)).prop_map(|mut products| {
            let mut seen = std::collections::HashSet::new();
            products.retain(|p| seen.insert(p.id.clone()));
            products
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;

    pub const TEST_BASE_URL: &str = "http://localhost:5000/api";

    /// Config with defaults and an unused session path.
    pub fn test_config() -> ClientConfig {
        ClientConfig::new(TEST_BASE_URL, "bazaar-test-session.json")
    }

    pub fn sample_user(role: Role) -> UserRecord {
        let mut user = UserRecord::new(7u64, role);
        user.name = Some("Ana Lima".to_string());
        user.email = Some("ana@example.com".to_string());
        user
    }

    pub fn sample_session(role: Role) -> SessionCredentials {
        SessionCredentials {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
            user: sample_user(role),
        }
    }

    /// In-memory session store already holding [`sample_session`].
    pub fn signed_in_store(role: Role) -> SessionStore {
        let store = SessionStore::in_memory();
        if let Err(err) = store.save(&sample_session(role)) {
            panic!("in-memory session save failed: {}", err);
        }
        store
    }

    pub fn sample_product(id: u64, name: &str) -> Product {
        Product::new(id).with_field("name", serde_json::json!(name))
    }

    /// Client over `transport` with a memory navigator parked on `route`.
    pub fn test_client(
        transport: Arc<MockTransport>,
        session: SessionStore,
        refresher: Option<Arc<MockRefresher>>,
        route: &str,
    ) -> (AuthClient, Arc<MemoryNavigator>) {
        let navigator = Arc::new(MemoryNavigator::new(route));
        let refresher = refresher.map(|r| r as Arc<dyn TokenRefresher>);
        let client = AuthClient::new(
            test_config(),
            transport,
            session,
            navigator.clone(),
            refresher,
        );
        (client, navigator)
    }
}
