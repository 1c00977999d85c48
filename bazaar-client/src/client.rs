//! Authenticated HTTP client.
//!
//! Every backend call goes through [`AuthClient::send`]:
//!
//! 1. Paths matching a public endpoint are sent as-is. Everything else gets
//!    `Authorization: Bearer <token>` from the session store, or goes out
//!    without it (with a warning) when no token is stored.
//! 2. A 401 on a non-public path triggers one refresh through the injected
//!    [`TokenRefresher`], then one resend with the new token.
//! 3. When the refresh cannot happen or fails, the session is cleared and the
//!    navigator is sent to the login route for the user's previous role.
//! 4. Any other failure becomes [`ClientError::Api`] with the server's
//!    message, or the generic fallback.

use std::sync::Arc;

use bazaar_core::{ClientConfig, SessionCredentials, UserRecord};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::navigation::{route_path, Navigator};
use crate::refresh::{HttpTokenRefresher, RefreshError, TokenRefresher};
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

/// Refresh-and-retry cycles allowed per original request.
pub const MAX_AUTH_RETRIES: u32 = 1;

#[derive(Clone)]
pub struct AuthClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl AuthClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
        refresher: Option<Arc<dyn TokenRefresher>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            session,
            navigator,
            refresher,
        }
    }

    /// Wire up the production collaborators: reqwest transport, file-backed
    /// session keys at `config.session_path`, and the HTTP refresher.
    pub fn from_config(config: ClientConfig, navigator: Arc<dyn Navigator>) -> ClientResult<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config)?);
        let refresher = HttpTokenRefresher::new(transport.clone(), config.auth.refresh_path.clone());
        let session = SessionStore::file(config.session_path.clone());
        Ok(Self::new(
            config,
            transport,
            session,
            navigator,
            Some(Arc::new(refresher)),
        ))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Send a request with credential handling and one-shot refresh.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.send_with_retries(&request, MAX_AUTH_RETRIES).await
    }

    async fn send_with_retries(
        &self,
        request: &ApiRequest,
        mut retries_left: u32,
    ) -> ClientResult<ApiResponse> {
        let public = self.config.is_public_endpoint(&request.path);

        loop {
            let outgoing = if public {
                request.clone()
            } else {
                self.authorize(request)?
            };
            let response = self.transport.execute(&outgoing).await?;

            if response.is_success() {
                return Ok(response);
            }

            if response.status == StatusCode::UNAUTHORIZED && !public && retries_left > 0 {
                retries_left -= 1;
                match self.refresh_session().await {
                    Ok(()) => {
                        info!(path = %request.path, "access token refreshed; resending request");
                        continue;
                    }
                    Err(reason) => return Err(self.expire_session(reason)),
                }
            }

            return Err(ClientError::from_response(&response));
        }
    }

    /// Copy of `request` carrying the stored access token.
    fn authorize(&self, request: &ApiRequest) -> ClientResult<ApiRequest> {
        let mut outgoing = request.clone();
        match self.session.access_token()? {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                outgoing.headers.insert(AUTHORIZATION, value);
            }
            None => {
                warn!(path = %request.path, "no access token stored; sending request without credentials");
            }
        }
        Ok(outgoing)
    }

    async fn refresh_session(&self) -> Result<(), RefreshError> {
        let refresher = self.refresher.as_ref().ok_or(RefreshError::NotConfigured)?;
        let refresh_token = self
            .session
            .refresh_token()?
            .ok_or(RefreshError::MissingRefreshToken)?;
        let tokens = refresher.refresh(&refresh_token).await?;
        self.session
            .update_tokens(&tokens.access_token, tokens.refresh_token.as_deref())?;
        Ok(())
    }

    /// Clear the stored session and send the user to the login route for the
    /// role they had. No navigation when already on that route.
    fn expire_session(&self, reason: RefreshError) -> ClientError {
        let role = self.session.role();
        let route = self.config.routes.for_role(role).to_string();

        if let Err(err) = self.session.clear() {
            warn!(error = %err, "failed to clear stored session");
        }

        let current = self.navigator.current_route();
        if route_path(&current) == route_path(&route) {
            debug!(%route, "session expired on the login route; not redirecting");
        } else {
            warn!(%reason, %route, "session expired; redirecting to login");
            self.navigator.navigate(&route);
        }

        ClientError::SessionExpired {
            reason: reason.to_string(),
            redirect_to: route,
        }
    }

    // ------------------------------------------------------------------------
    // JSON helpers
    // ------------------------------------------------------------------------

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.send(ApiRequest::post(path, body)).await?.json()
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.send(ApiRequest::put(path, body)).await?.json()
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    /// Sign in and persist the returned session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<SessionCredentials> {
        let path = self.config.auth.login_path.clone();
        let session: SessionCredentials = self
            .post_json(&path, &json!({ "email": email, "password": password }))
            .await?;
        self.session.save(&session)?;
        info!(user_id = %session.user.id, role = %session.user.role, "signed in");
        Ok(session)
    }

    /// Forget the stored session. The product cache is cleared by the caller.
    pub fn logout(&self) -> ClientResult<()> {
        self.session.clear()?;
        info!("signed out");
        Ok(())
    }

    pub fn current_user(&self) -> ClientResult<Option<UserRecord>> {
        Ok(self.session.user()?)
    }
}
