pub mod cache;
pub mod client;
pub mod model;
pub mod mutator;

pub use cache::{Clock, InventoryCache, SystemClock};
pub use client::{HttpInventoryClient, InventoryApi, InventoryError, Resource};
pub use model::{Group, Product, RemoteProduct};
pub use mutator::InventoryMutator;
