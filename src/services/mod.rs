pub mod auth_service;
pub mod catalog_service;
pub mod enrichment;
pub mod order_service;
pub mod reconciliation;
