//! Stock reconciliation for approved orders.
//!
//! Approval decrements remote stock for every product on the order. The
//! provider has no multi-object transaction, so this runs as a saga: one
//! independent read-modify-write per product, stopping at the first failure
//! and reporting what was and was not applied. Nothing is compensated.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    inventory::{InventoryMutator, model::as_finite_number},
    models::OrderStatus,
};

/// Aggregated decrement for one product on one order. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAdjustment {
    pub product_id: String,
    pub decrement: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct AppliedAdjustment {
    pub product_id: String,
    pub decrement: f64,
    pub previous_quantity: Option<f64>,
    #[schema(value_type = f64)]
    pub new_quantity: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct FailedAdjustment {
    pub product_id: String,
    pub decrement: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq)]
pub struct SyncReport {
    pub applied: Vec<AppliedAdjustment>,
    pub failed: Option<FailedAdjustment>,
    /// Products never attempted because an earlier step failed.
    pub skipped: Vec<String>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Only a transition into `approved` touches stock; re-approving an order
/// that is already approved is a no-op.
pub fn should_reconcile(previous: OrderStatus, requested: Option<OrderStatus>) -> bool {
    requested == Some(OrderStatus::Approved) && previous != OrderStatus::Approved
}

/// Sums decrements per product id, in first-seen order. Items without a usable
/// product id are ignored; a quantity that is not a positive finite number
/// counts as 1.
pub fn aggregate_decrements(items: &Value) -> Vec<PendingAdjustment> {
    let Some(entries) = items.as_array() else {
        return Vec::new();
    };

    let mut adjustments: Vec<PendingAdjustment> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries.iter().filter(|e| e.is_object()) {
        let Some(product_id) = entry.get("id").and_then(line_item_product_id) else {
            continue;
        };
        let decrement = entry
            .get("quantity")
            .and_then(as_finite_number)
            .filter(|q| *q > 0.0)
            .unwrap_or(1.0);

        match index.get(&product_id) {
            Some(&pos) => adjustments[pos].decrement += decrement,
            None => {
                index.insert(product_id.clone(), adjustments.len());
                adjustments.push(PendingAdjustment {
                    product_id,
                    decrement,
                });
            }
        }
    }

    adjustments
}

fn line_item_product_id(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// `max(0, current - decrement)`. An unreadable current quantity is treated
/// as exactly the decrement, so the result floors at zero instead of failing.
pub fn next_quantity(current: Option<f64>, decrement: f64) -> f64 {
    let current = current.filter(|q| q.is_finite()).unwrap_or(decrement);
    (current - decrement).max(0.0)
}

pub async fn reconcile(
    mutator: &InventoryMutator,
    adjustments: Vec<PendingAdjustment>,
) -> SyncReport {
    let mut report = SyncReport::default();
    let mut pending = adjustments
        .into_iter()
        .filter(|adj| adj.decrement > 0.0)
        .peekable();

    while let Some(adj) = pending.next() {
        match apply_one(mutator, &adj).await {
            Ok(applied) => report.applied.push(applied),
            Err(reason) => {
                tracing::error!(
                    product_id = %adj.product_id,
                    decrement = adj.decrement,
                    reason = %reason,
                    "stock decrement failed, halting reconciliation"
                );
                report.failed = Some(FailedAdjustment {
                    product_id: adj.product_id,
                    decrement: adj.decrement,
                    reason,
                });
                report.skipped = pending.map(|rest| rest.product_id).collect();
                break;
            }
        }
    }

    report
}

async fn apply_one(
    mutator: &InventoryMutator,
    adj: &PendingAdjustment,
) -> Result<AppliedAdjustment, String> {
    let product = mutator
        .fetch_product(&adj.product_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("product {} not found in inventory", adj.product_id))?;

    let new_quantity = next_quantity(product.quantity, adj.decrement);
    let written = mutator
        .set_quantity(&adj.product_id, new_quantity)
        .await
        .map_err(|e| e.to_string())?;

    Ok(AppliedAdjustment {
        product_id: adj.product_id.clone(),
        decrement: adj.decrement,
        previous_quantity: product.quantity,
        new_quantity: written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_products_accumulate() {
        let items = json!([
            { "id": "p1", "name": "Tea", "price": 10, "quantity": 2 },
            { "id": "p2", "name": "Mug", "price": 50, "quantity": 1 },
            { "id": "p1", "name": "Tea", "price": 10, "quantity": 3 }
        ]);
        assert_eq!(
            aggregate_decrements(&items),
            vec![
                PendingAdjustment {
                    product_id: "p1".into(),
                    decrement: 5.0
                },
                PendingAdjustment {
                    product_id: "p2".into(),
                    decrement: 1.0
                },
            ]
        );
    }

    #[test]
    fn odd_quantities_default_to_one() {
        let items = json!([
            { "id": "a", "quantity": 0 },
            { "id": "b", "quantity": -4 },
            { "id": "c", "quantity": "many" },
            { "id": "d" },
            { "id": "e", "quantity": "2.5" }
        ]);
        let decrements: Vec<f64> = aggregate_decrements(&items)
            .into_iter()
            .map(|a| a.decrement)
            .collect();
        assert_eq!(decrements, vec![1.0, 1.0, 1.0, 1.0, 2.5]);
    }

    #[test]
    fn unusable_ids_are_skipped() {
        let items = json!([
            { "id": "", "quantity": 1 },
            { "id": null, "quantity": 1 },
            { "id": 1.5, "quantity": 1 },
            { "quantity": 1 },
            { "id": 42, "quantity": 2 },
            "p9"
        ]);
        assert_eq!(
            aggregate_decrements(&items),
            vec![PendingAdjustment {
                product_id: "42".into(),
                decrement: 2.0
            }]
        );
        assert!(aggregate_decrements(&json!({ "id": "p1" })).is_empty());
    }

    #[test]
    fn next_quantity_floors_at_zero() {
        assert_eq!(next_quantity(Some(3.0), 5.0), 0.0);
        assert_eq!(next_quantity(Some(10.0), 4.0), 6.0);
        assert_eq!(next_quantity(Some(2.5), 0.75), 1.75);
        assert_eq!(next_quantity(None, 5.0), 0.0);
        assert_eq!(next_quantity(Some(f64::INFINITY), 2.0), 0.0);
    }

    #[test]
    fn reconcile_only_on_transition_into_approved() {
        use OrderStatus::*;
        assert!(should_reconcile(PendingReview, Some(Approved)));
        assert!(should_reconcile(Rejected, Some(Approved)));
        assert!(!should_reconcile(Approved, Some(Approved)));
        assert!(!should_reconcile(PendingReview, Some(Rejected)));
        assert!(!should_reconcile(PendingReview, None));
    }
}
