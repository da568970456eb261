//! Read-through snapshot cache over the inventory provider.
//!
//! Products and groups each get their own entry behind their own
//! `tokio::sync::Mutex`. A refresh holds the gate for the whole paginated
//! fetch, so callers arriving mid-refresh wait and then read the fresh
//! snapshot instead of issuing their own remote calls. Snapshots are
//! replaced wholesale and handed out as `Arc<[T]>`.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::Value;
use tokio::sync::Mutex;

use super::{
    client::{InventoryApi, InventoryError, Resource, fetch_paginated},
    model::{Group, Product, normalize_group, normalize_product},
};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct CacheEntry<T> {
    fetched_at: Option<Instant>,
    data: Arc<[T]>,
}

impl<T> CacheEntry<T> {
    fn empty() -> Self {
        Self {
            fetched_at: None,
            data: Arc::from(Vec::new()),
        }
    }

    /// Never-fetched and invalidated entries have no timestamp and are always
    /// stale. A successful fetch that came back empty is still fresh.
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < ttl)
    }
}

pub struct InventoryCache {
    api: Arc<dyn InventoryApi>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    products: Mutex<CacheEntry<Product>>,
    groups: Mutex<CacheEntry<Group>>,
}

impl InventoryCache {
    pub fn new(api: Arc<dyn InventoryApi>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            api,
            clock,
            ttl,
            products: Mutex::new(CacheEntry::empty()),
            groups: Mutex::new(CacheEntry::empty()),
        }
    }

    pub fn api(&self) -> &Arc<dyn InventoryApi> {
        &self.api
    }

    pub async fn products(&self, force_refresh: bool) -> Result<Arc<[Product]>, InventoryError> {
        self.read_through(&self.products, Resource::Products, force_refresh, normalize_product)
            .await
    }

    pub async fn groups(&self, force_refresh: bool) -> Result<Arc<[Group]>, InventoryError> {
        self.read_through(&self.groups, Resource::Groups, force_refresh, normalize_group)
            .await
    }

    /// Forces the next product read to go to the provider. The group entry is
    /// left alone.
    pub async fn invalidate_products(&self) {
        self.products.lock().await.fetched_at = None;
        tracing::debug!("product cache invalidated");
    }

    async fn read_through<T>(
        &self,
        gate: &Mutex<CacheEntry<T>>,
        resource: Resource,
        force_refresh: bool,
        normalize: fn(&Value) -> Option<T>,
    ) -> Result<Arc<[T]>, InventoryError> {
        let mut entry = gate.lock().await;

        if !force_refresh && entry.is_fresh(self.clock.now(), self.ttl) {
            tracing::debug!(
                resource = resource.path_segment(),
                "serving cached snapshot"
            );
            return Ok(Arc::clone(&entry.data));
        }

        // On failure the previous snapshot stays as it was.
        let raw = fetch_paginated(self.api.as_ref(), resource).await?;
        let fetched = raw.len();
        let data: Arc<[T]> = raw.iter().filter_map(normalize).collect::<Vec<_>>().into();

        entry.data = Arc::clone(&data);
        entry.fetched_at = Some(self.clock.now());

        tracing::info!(
            resource = resource.path_segment(),
            fetched,
            kept = data.len(),
            "refreshed catalog snapshot"
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_entry_is_never_fresh() {
        let entry: CacheEntry<Group> = CacheEntry::empty();
        assert!(!entry.is_fresh(Instant::now(), Duration::from_secs(60)));
    }

    #[test]
    fn fetched_empty_entry_is_fresh_until_ttl() {
        let start = Instant::now();
        let entry: CacheEntry<Group> = CacheEntry {
            fetched_at: Some(start),
            data: Arc::from(Vec::new()),
        };
        let ttl = Duration::from_secs(60);
        assert!(entry.is_fresh(start + Duration::from_secs(59), ttl));
        assert!(!entry.is_fresh(start + Duration::from_secs(60), ttl));
    }
}
