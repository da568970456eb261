use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::OrderStatus;

/// `(page, per_page, offset)` with page >= 1 and per_page in 1..=100. The
/// offset saturates instead of overflowing on absurd page numbers.
pub fn normalize_page(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1).saturating_mul(per_page);
    (page, per_page, offset)
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub group_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl OrderListQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize_page(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_clamped() {
        assert_eq!(normalize_page(None, None), (1, 20, 0));
        assert_eq!(normalize_page(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(normalize_page(Some(3), Some(0)), (3, 1, 2));
        assert_eq!(normalize_page(Some(2), Some(20)), (2, 20, 20));
    }

    #[test]
    fn huge_page_saturates_offset() {
        assert_eq!(
            normalize_page(Some(i64::MAX), Some(20)),
            (i64::MAX, 20, i64::MAX)
        );
        assert_eq!(normalize_page(Some(i64::MIN), Some(20)), (1, 20, 0));
    }
}
