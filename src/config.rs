use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub inventory: InventoryConfig,
    pub identity: IdentityConfig,
    pub default_currency: String,
}

/// Connection settings for the point-of-sale catalog API.
#[derive(Clone)]
pub struct InventoryConfig {
    pub base_url: String,
    pub store_id: String,
    pub token: String,
    pub cache_ttl: Duration,
}

#[derive(Clone)]
pub struct IdentityConfig {
    pub url: String,
    pub service_key: String,
}

impl std::fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("base_url", &self.base_url)
            .field("store_id", &self.store_id)
            .field("token", &"[REDACTED]")
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let cache_ttl_secs = env::var("CATALOG_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let inventory = InventoryConfig {
            base_url: env::var("INVENTORY_BASE_URL")
                .unwrap_or_else(|_| "https://api.evotor.ru".to_string()),
            store_id: require("INVENTORY_STORE_ID")?,
            token: require("INVENTORY_TOKEN")?,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        };

        let identity = IdentityConfig {
            url: require("IDENTITY_URL")?,
            service_key: require("IDENTITY_SERVICE_KEY")?,
        };

        let default_currency = env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "RUB".to_string());

        Ok(Self {
            port,
            database_url,
            host,
            inventory,
            identity,
            default_currency,
        })
    }
}

fn require(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("{key} is not set"))
}
