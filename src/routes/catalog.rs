use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::catalog::{CatalogPage, GroupList},
    error::AppResult,
    response::ApiResponse,
    routes::params::CatalogQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items))
        .route("/groups", get(list_groups))
}

#[utoipa::path(
    get,
    path = "/api/catalog/items",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Sellable products", body = ApiResponse<CatalogPage>),
        (status = 502, description = "Inventory provider unavailable")
    ),
    tag = "Catalog"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<CatalogPage>>> {
    let resp = catalog_service::list_items(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/catalog/groups",
    responses(
        (status = 200, description = "Product groups", body = ApiResponse<GroupList>),
        (status = 502, description = "Inventory provider unavailable")
    ),
    tag = "Catalog"
)]
pub async fn list_groups(State(state): State<AppState>) -> AppResult<Json<ApiResponse<GroupList>>> {
    let resp = catalog_service::list_groups(&state).await?;
    Ok(Json(resp))
}
