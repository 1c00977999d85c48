//! Command handlers.

use std::path::Path;
use std::sync::Arc;

use bazaar_cache::{CacheConfig, CacheRead, ProductCache};
use bazaar_client::{AuthClient, MemoryNavigator, ProductApi};
use bazaar_core::{ClientConfig, ConfigError, ProductId, SystemClock};
use tracing::{debug, info};

use crate::cli::{ListArgs, LoginArgs, ProductArgs};
use crate::error::CliResult;

/// Read and validate the config at `path`.
pub fn load_config(path: Option<&Path>) -> CliResult<ClientConfig> {
    let path = path.ok_or(ConfigError::MissingConfigPath)?;
    let config = ClientConfig::from_path(path)?;
    config.validate()?;
    debug!(path = %path.display(), base_url = %config.api_base_url, "config loaded");
    Ok(config)
}

/// Client, navigator and product cache for one invocation.
pub struct App {
    pub client: AuthClient,
    pub navigator: Arc<MemoryNavigator>,
    pub products: ProductCache<ProductApi>,
}

impl App {
    pub fn new(config: ClientConfig, route: &str) -> CliResult<Self> {
        let cache_config = CacheConfig::from(&config.cache);
        let navigator = Arc::new(MemoryNavigator::new(route));
        let client = AuthClient::from_config(config, navigator.clone())?;
        let products = ProductCache::new(
            ProductApi::new(client.clone()),
            Arc::new(SystemClock),
            cache_config,
        );
        Ok(Self {
            client,
            navigator,
            products,
        })
    }

    pub async fn login(&self, args: &LoginArgs) -> CliResult<()> {
        let session = self.client.login(&args.email, &args.password).await?;
        println!("Signed in as {} ({})", display_name(&session.user), session.user.role);
        Ok(())
    }

    pub async fn logout(&self) -> CliResult<()> {
        self.client.logout()?;
        self.products.clear().await;
        println!("Signed out");
        Ok(())
    }

    pub fn whoami(&self) -> CliResult<()> {
        match self.client.current_user()? {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("Not signed in"),
        }
        Ok(())
    }

    pub async fn list_products(&self, args: &ListArgs) -> CliResult<()> {
        let read = self.products.fetch_all(args.refresh).await?;
        log_read(&read, "product list");
        println!("{}", serde_json::to_string_pretty(read.value())?);
        Ok(())
    }

    pub async fn show_product(&self, args: &ProductArgs) -> CliResult<()> {
        let id = ProductId::from(args.id.as_str());
        let read = self.products.fetch_by_id(&id, args.refresh).await?;
        log_read(&read, "product");
        println!("{}", serde_json::to_string_pretty(read.value())?);
        Ok(())
    }

    /// Route the session ended on, when an expired session moved it.
    pub fn redirected_to(&self) -> Option<String> {
        self.navigator.history().last().cloned()
    }
}

fn display_name(user: &bazaar_core::UserRecord) -> String {
    user.name
        .clone()
        .or_else(|| user.email.clone())
        .unwrap_or_else(|| user.id.to_string())
}

fn log_read<T>(read: &CacheRead<T>, what: &str) {
    info!(
        source = ?read.source(),
        fetched_at = %read.fetched_at(),
        "{} loaded",
        what
    );
}
