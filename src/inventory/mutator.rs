use std::sync::Arc;

use serde_json::Value;

use super::{
    cache::InventoryCache,
    client::{InventoryApi, InventoryError},
    model::RemoteProduct,
};

/// Writes stock levels back to the provider. Reads here never touch the
/// cache; every successful write invalidates the cached product snapshot.
#[derive(Clone)]
pub struct InventoryMutator {
    api: Arc<dyn InventoryApi>,
    cache: Arc<InventoryCache>,
}

impl InventoryMutator {
    pub fn new(cache: Arc<InventoryCache>) -> Self {
        Self {
            api: Arc::clone(cache.api()),
            cache,
        }
    }

    pub async fn fetch_product(&self, id: &str) -> Result<Option<RemoteProduct>, InventoryError> {
        let raw = self.api.fetch_product(id).await?;
        Ok(raw.map(|raw| RemoteProduct::from_value(id, &raw)))
    }

    /// Returns the quantity actually sent.
    pub async fn set_quantity(&self, id: &str, quantity: f64) -> Result<Value, InventoryError> {
        let payload = quantity_payload(quantity)?;
        self.api.update_quantity(id, payload.clone()).await?;
        self.cache.invalidate_products().await;

        tracing::info!(product_id = %id, quantity = %payload, "stock level written");
        Ok(payload)
    }
}

/// Clamps to zero, sends whole numbers as integers and rounds everything else
/// to six decimal places.
pub fn quantity_payload(quantity: f64) -> Result<Value, InventoryError> {
    if !quantity.is_finite() {
        return Err(InventoryError::InvalidQuantity(quantity));
    }

    let quantity = quantity.max(0.0);
    if quantity.fract() == 0.0 {
        if quantity <= i64::MAX as f64 {
            return Ok(Value::from(quantity as i64));
        }
        return Ok(Value::from(quantity));
    }

    let rounded = (quantity * 1_000_000.0).round() / 1_000_000.0;
    Ok(Value::from(rounded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_quantities_are_sent_as_integers() {
        assert_eq!(quantity_payload(4.0).unwrap(), json!(4));
        assert!(quantity_payload(4.0).unwrap().is_i64());
    }

    #[test]
    fn negatives_clamp_to_zero() {
        assert_eq!(quantity_payload(-2.0).unwrap(), json!(0));
        assert_eq!(quantity_payload(-0.25).unwrap(), json!(0));
    }

    #[test]
    fn fractions_round_to_six_places() {
        assert_eq!(quantity_payload(1.23456789).unwrap(), json!(1.234568));
        assert_eq!(quantity_payload(0.5).unwrap(), json!(0.5));
    }

    #[test]
    fn whole_numbers_beyond_i64_stay_numeric() {
        let payload = quantity_payload(1e20).unwrap();
        assert!(payload.is_number());
        assert_eq!(payload, json!(1e20));
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(matches!(
            quantity_payload(f64::NAN),
            Err(InventoryError::InvalidQuantity(_))
        ));
        assert!(matches!(
            quantity_payload(f64::INFINITY),
            Err(InventoryError::InvalidQuantity(_))
        ));
    }
}
