use std::collections::HashMap;

use crate::{
    dto::catalog::{CatalogItem, CatalogPage, GroupList},
    error::AppResult,
    inventory::{Group, Product},
    response::{ApiResponse, Meta, total_pages},
    routes::params::{CatalogQuery, normalize_page},
    state::AppState,
};

pub async fn list_items(
    state: &AppState,
    query: CatalogQuery,
) -> AppResult<ApiResponse<CatalogPage>> {
    // Separate cache gates, so both refreshes may run at once.
    let (products, groups) = tokio::try_join!(state.catalog.products(false), state.catalog.groups(false))?;

    let page = build_page(&products, &groups, &query);
    let meta = Meta::new(page.page, page.page_size, page.total);
    Ok(ApiResponse::success("Catalog items", page, Some(meta)))
}

pub async fn list_groups(state: &AppState) -> AppResult<ApiResponse<GroupList>> {
    let groups = state.catalog.groups(false).await?;
    let data = GroupList {
        items: groups.to_vec(),
    };
    Ok(ApiResponse::success("Catalog groups", data, Some(Meta::empty())))
}

/// Filters by group and by a case-insensitive substring of the product name
/// or its group's name, then cuts out the requested page.
pub fn build_page(products: &[Product], groups: &[Group], query: &CatalogQuery) -> CatalogPage {
    let (page, page_size, offset) = normalize_page(query.page, query.page_size);
    let group_names: HashMap<&str, &str> = groups
        .iter()
        .map(|g| (g.id.as_str(), g.name.as_str()))
        .collect();
    let group_name_of =
        |p: &Product| p.group_id.as_deref().and_then(|id| group_names.get(id).copied());

    let group_filter = query.group_id.as_deref().filter(|g| !g.is_empty());
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let matching: Vec<&Product> = products
        .iter()
        .filter(|p| group_filter.is_none_or(|g| p.group_id.as_deref() == Some(g)))
        .filter(|p| {
            needle.as_deref().is_none_or(|needle| {
                p.name.to_lowercase().contains(needle)
                    || group_name_of(p).is_some_and(|name| name.to_lowercase().contains(needle))
            })
        })
        .collect();

    let total = matching.len() as i64;
    let items = matching
        .into_iter()
        .skip(offset as usize)
        .take(page_size as usize)
        .map(|p| CatalogItem {
            id: p.id.clone(),
            name: p.name.clone(),
            price: p.price,
            quantity: p.quantity,
            group_id: p.group_id.clone(),
            group_name: group_name_of(p).map(String::from),
            measure_name: p.measure_name.clone(),
        })
        .collect();

    CatalogPage {
        items,
        page,
        page_size,
        total,
        total_pages: total_pages(total, page_size),
    }
}
