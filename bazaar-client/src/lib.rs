//! Bazaar client library exports.
//!
//! [`AuthClient`] is the single entry point for backend calls. It attaches
//! bearer credentials from the [`SessionStore`], recovers from an expired
//! access token with one refresh-and-retry, and sends the user back to a
//! login route through the [`Navigator`] when recovery fails.

pub mod client;
pub mod error;
pub mod navigation;
pub mod products;
pub mod refresh;
pub mod session;
pub mod transport;

pub use client::{AuthClient, MAX_AUTH_RETRIES};
pub use error::{error_message, ClientError, ClientResult, StorageError};
pub use navigation::{MemoryNavigator, Navigator};
pub use products::ProductApi;
pub use refresh::{HttpTokenRefresher, RefreshError, RefreshedTokens, TokenRefresher};
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionStore};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
