use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    identity::IdentityProvider,
    inventory::{InventoryCache, InventoryMutator},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub catalog: Arc<InventoryCache>,
    pub inventory: InventoryMutator,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<AppConfig>,
}
