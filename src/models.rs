use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    PendingReview,
    AwaitingPayment,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingReview => "pending_review",
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_review" => Ok(OrderStatus::PendingReview),
            "awaiting_payment" => Ok(OrderStatus::AwaitingPayment),
            "approved" => Ok(OrderStatus::Approved),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Canceled,
    Error,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Error => "error",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "canceled" => Ok(PaymentStatus::Canceled),
            "error" => Ok(PaymentStatus::Error),
            other => Err(format!("unknown payment status `{other}`")),
        }
    }
}

/// One cart line captured at checkout. `id` is the inventory product id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderShippingAddress {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub city: Option<String>,
    pub address: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Saved address on a user profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ShippingAddress {
    pub id: String,
    pub title: String,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub currency: String,
    pub total_cost: i64,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<OrderShippingAddress>,
    pub tracking_code: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Display-ready owner of an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderUser {
    pub id: Option<Uuid>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Stored items are JSON; entries that no longer match the item shape are
/// dropped rather than failing the whole order.
pub fn items_from_json(raw: &Value) -> Vec<OrderItem> {
    raw.as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn shipping_from_json(raw: Option<&Value>) -> Option<OrderShippingAddress> {
    raw.filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statuses_round_trip_through_their_column_text() {
        for status in [
            OrderStatus::PendingReview,
            OrderStatus::AwaitingPayment,
            OrderStatus::Approved,
            OrderStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!("paid".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
    }

    #[test]
    fn malformed_items_are_skipped() {
        let raw = json!([
            { "id": "p1", "name": "Tea", "price": 100, "quantity": 2 },
            { "id": "p2", "name": "Broken" },
            "garbage"
        ]);
        let items = items_from_json(&raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "p1");
        assert!(items_from_json(&json!(null)).is_empty());
    }
}
