use serde::Serialize;
use utoipa::ToSchema;

use crate::inventory::Group;

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: f64,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub measure_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupList {
    pub items: Vec<Group>,
}
