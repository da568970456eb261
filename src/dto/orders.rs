use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    Order, OrderItem, OrderShippingAddress, OrderStatus, OrderUser, PaymentStatus,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
    pub shipping_address: OrderShippingAddress,
    pub currency: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub currency: Option<String>,
    pub total_cost: Option<i64>,
    pub items: Option<Vec<OrderItem>>,
    pub shipping_address: Option<OrderShippingAddress>,
    pub tracking_code: Option<String>,
}

impl UpdateOrderRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.payment_status.is_none()
            && self.currency.is_none()
            && self.total_cost.is_none()
            && self.items.is_none()
            && self.shipping_address.is_none()
            && self.tracking_code.is_none()
    }
}

/// An order as returned to clients, with its owner resolved.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct OrderResult {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub user: OrderUser,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub currency: String,
    pub total_cost: i64,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<OrderShippingAddress>,
    pub tracking_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderResult {
    pub fn new(order: Order, user: OrderUser) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            user,
            status: order.status,
            payment_status: order.payment_status,
            currency: order.currency,
            total_cost: order.total_cost,
            items: order.items,
            shipping_address: order.shipping_address,
            tracking_code: order.tracking_code,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderResult>,
}
