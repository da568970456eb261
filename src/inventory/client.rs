use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::config::{CONNECT_TIMEOUT, InventoryConfig, READ_TIMEOUT, REQUEST_TIMEOUT};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("could not reach the inventory provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inventory provider rejected the authorization token")]
    Unauthorized,

    #[error("inventory provider returned status {0}")]
    Status(u16),

    #[error("inventory provider sent an unreadable body: {0}")]
    Decode(String),

    #[error("computed stock quantity {0} is not a finite number")]
    InvalidQuantity(f64),
}

impl InventoryError {
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            InventoryError::Unauthorized => Some(401),
            InventoryError::Status(code) => Some(*code),
            InventoryError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Paginated collections exposed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Groups,
}

impl Resource {
    pub fn path_segment(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Groups => "product-groups",
        }
    }
}

/// Narrow contract over the point-of-sale catalog API.
///
/// Implementations return raw JSON; normalization lives in
/// [`crate::inventory::model`].
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// One page of `resource`, as the full response body.
    async fn fetch_page(
        &self,
        resource: Resource,
        cursor: Option<&str>,
    ) -> Result<Value, InventoryError>;

    /// `Ok(None)` on a remote 404.
    async fn fetch_product(&self, id: &str) -> Result<Option<Value>, InventoryError>;

    async fn update_quantity(&self, id: &str, quantity: Value) -> Result<(), InventoryError>;
}

/// Walks the cursor protocol until the provider stops handing out new
/// cursors. A cursor equal to the one just used also ends the walk.
pub async fn fetch_paginated(
    api: &dyn InventoryApi,
    resource: Resource,
) -> Result<Vec<Value>, InventoryError> {
    let mut collected = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let payload = api.fetch_page(resource, cursor.as_deref()).await?;
        pages += 1;

        if let Some(items) = payload.get("items").and_then(Value::as_array) {
            collected.extend(items.iter().filter(|item| item.is_object()).cloned());
        }

        match extract_next_cursor(&payload, cursor.as_deref()) {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!(
        resource = resource.path_segment(),
        pages,
        records = collected.len(),
        "fetched paginated collection"
    );
    Ok(collected)
}

pub fn extract_next_cursor(payload: &Value, previous: Option<&str>) -> Option<String> {
    let paging = payload.get("paging")?.as_object()?;
    let candidate = [paging.get("next_cursor"), paging.get("cursor")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|c| !c.is_empty())?;

    if Some(candidate) == previous {
        return None;
    }
    Some(candidate.to_string())
}

/// HTTP implementation against an Evotor-style REST API.
#[derive(Clone)]
pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: String,
    store_id: String,
    token: String,
}

impl HttpInventoryClient {
    pub fn new(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store_id: config.store_id.clone(),
            token: config.token.clone(),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/stores/{}/{}", self.base_url, self.store_id, tail)
    }

    fn check(status: StatusCode) -> Result<(), InventoryError> {
        if status == StatusCode::UNAUTHORIZED {
            tracing::error!("inventory provider rejected the configured token");
            return Err(InventoryError::Unauthorized);
        }
        if status.as_u16() >= 400 {
            return Err(InventoryError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn json_body(resp: reqwest::Response) -> Result<Value, InventoryError> {
        resp.json::<Value>()
            .await
            .map_err(|e| InventoryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryClient {
    async fn fetch_page(
        &self,
        resource: Resource,
        cursor: Option<&str>,
    ) -> Result<Value, InventoryError> {
        let mut req = self
            .http
            .get(self.url(resource.path_segment()))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(cursor) = cursor {
            req = req.query(&[("cursor", cursor)]);
        }

        let resp = req.send().await?;
        Self::check(resp.status())?;
        Self::json_body(resp).await
    }

    async fn fetch_product(&self, id: &str) -> Result<Option<Value>, InventoryError> {
        let resp = self
            .http
            .get(self.url(&format!("products/{id}")))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check(resp.status())?;

        let body = Self::json_body(resp).await?;
        Ok(body.is_object().then_some(body))
    }

    async fn update_quantity(&self, id: &str, quantity: Value) -> Result<(), InventoryError> {
        let resp = self
            .http
            .patch(self.url(&format!("products/{id}")))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "quantity": quantity }))
            .send()
            .await?;
        Self::check(resp.status())
    }
}
