#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde_json::{Value, json};
use storefront_api::{
    identity::{
        AuthSession, IdentityError, IdentityProvider, IdentityUpdate, IdentityUser, NewIdentity,
        TokenBundle, UserMetadata,
    },
    inventory::{Clock, InventoryApi, InventoryCache, InventoryError, Resource},
};
use uuid::Uuid;

/// In-memory inventory provider with call counters and failure switches.
#[derive(Default)]
pub struct FakeInventory {
    pages: Mutex<HashMap<(Resource, Option<String>), Value>>,
    products: Mutex<HashMap<String, Value>>,
    updates: Mutex<Vec<(String, Value)>>,
    failing_updates: Mutex<HashSet<String>>,
    fail_pages: AtomicBool,
    page_delay: Mutex<Option<Duration>>,
    page_calls: AtomicUsize,
    product_calls: AtomicUsize,
}

impl FakeInventory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Single-page listing for `resource`.
    pub fn set_items(&self, resource: Resource, items: Value) {
        let mut pages = self.pages.lock().unwrap();
        pages.retain(|(r, _), _| *r != resource);
        pages.insert((resource, None), json!({ "items": items }));
    }

    /// Page answered when `cursor` is sent.
    pub fn set_page(&self, resource: Resource, cursor: Option<&str>, body: Value) {
        self.pages
            .lock()
            .unwrap()
            .insert((resource, cursor.map(String::from)), body);
    }

    pub fn put_product(&self, id: &str, quantity: Value) {
        self.products
            .lock()
            .unwrap()
            .insert(id.to_string(), json!({ "id": id, "quantity": quantity }));
    }

    pub fn fail_update_for(&self, id: &str) {
        self.failing_updates.lock().unwrap().insert(id.to_string());
    }

    pub fn set_failing_pages(&self, failing: bool) {
        self.fail_pages.store(failing, Ordering::SeqCst);
    }

    pub fn set_page_delay(&self, delay: Duration) {
        *self.page_delay.lock().unwrap() = Some(delay);
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn quantity_of(&self, id: &str) -> Option<Value> {
        self.products
            .lock()
            .unwrap()
            .get(id)
            .and_then(|p| p.get("quantity").cloned())
    }
}

#[async_trait]
impl InventoryApi for FakeInventory {
    async fn fetch_page(
        &self,
        resource: Resource,
        cursor: Option<&str>,
    ) -> Result<Value, InventoryError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.page_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(InventoryError::Status(503));
        }
        let body = self
            .pages
            .lock()
            .unwrap()
            .get(&(resource, cursor.map(String::from)))
            .cloned()
            .unwrap_or_else(|| json!({ "items": [] }));
        Ok(body)
    }

    async fn fetch_product(&self, id: &str) -> Result<Option<Value>, InventoryError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.lock().unwrap().get(id).cloned())
    }

    async fn update_quantity(&self, id: &str, quantity: Value) -> Result<(), InventoryError> {
        if self.failing_updates.lock().unwrap().contains(id) {
            return Err(InventoryError::Status(500));
        }
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), quantity.clone()));
        if let Some(product) = self.products.lock().unwrap().get_mut(id) {
            product["quantity"] = quantity;
        }
        Ok(())
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

pub const TTL: Duration = Duration::from_secs(60);

pub fn cache_with(api: &Arc<FakeInventory>, clock: &Arc<ManualClock>) -> Arc<InventoryCache> {
    Arc::new(InventoryCache::new(
        Arc::clone(api) as Arc<dyn InventoryApi>,
        Arc::clone(clock) as Arc<dyn Clock>,
        TTL,
    ))
}

pub fn product(id: &str, name: &str, quantity: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": 100,
        "quantity": quantity,
        "allow_to_sell": true,
        "parent_id": "g1",
        "measure_name": "pcs"
    })
}

/// In-memory identity provider keyed by token and user id.
#[derive(Default)]
pub struct FakeIdentity {
    users: Mutex<HashMap<Uuid, IdentityUser>>,
    tokens: Mutex<HashMap<String, Uuid>>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, email: &str, metadata: Value) -> IdentityUser {
        let user = IdentityUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: serde_json::from_value::<UserMetadata>(metadata).unwrap(),
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        self.tokens
            .lock()
            .unwrap()
            .insert(format!("token-{}", user.id), user.id);
        user
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), IdentityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected {
                status: 503,
                message: "unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(&self, identity: &NewIdentity) -> Result<AuthSession, IdentityError> {
        self.check_available()?;
        let metadata = serde_json::to_value(&identity.data).unwrap();
        let user = self.add_user(&identity.email, metadata);
        Ok(AuthSession {
            tokens: Some(TokenBundle {
                access_token: format!("token-{}", user.id),
                refresh_token: None,
            }),
            user: Some(user),
        })
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthSession, IdentityError> {
        self.check_available()?;
        let user = self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned()
            .ok_or(IdentityError::Rejected {
                status: 400,
                message: "Invalid login credentials".into(),
            })?;
        Ok(AuthSession {
            tokens: Some(TokenBundle {
                access_token: format!("token-{}", user.id),
                refresh_token: None,
            }),
            user: Some(user),
        })
    }

    async fn user_for_token(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        self.check_available()?;
        let id = self.tokens.lock().unwrap().get(token).copied();
        id.and_then(|id| self.users.lock().unwrap().get(&id).cloned())
            .ok_or(IdentityError::Rejected {
                status: 401,
                message: "invalid JWT".into(),
            })
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<IdentityUser>, IdentityError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        update: &IdentityUpdate,
    ) -> Result<IdentityUser, IdentityError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(IdentityError::Rejected {
            status: 404,
            message: "User not found".into(),
        })?;
        if let Some(email) = &update.email {
            user.email = Some(email.clone());
        }
        if let Some(metadata) = &update.user_metadata {
            user.user_metadata = metadata.clone();
        }
        Ok(user.clone())
    }
}
