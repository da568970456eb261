mod common;

use chrono::Utc;
use common::FakeIdentity;
use serde_json::json;
use storefront_api::{
    models::{Order, OrderStatus, PaymentStatus},
    services::enrichment::{resolve_owner, resolve_owners},
};
use uuid::Uuid;

fn order(id: i64, user_id: Option<Uuid>) -> Order {
    Order {
        id,
        user_id,
        status: OrderStatus::PendingReview,
        payment_status: PaymentStatus::Unpaid,
        currency: "RUB".into(),
        total_cost: 1000,
        items: Vec::new(),
        shipping_address: None,
        tracking_code: None,
        customer_name: Some("Checkout Name".into()),
        customer_phone: Some("+7 900 000 00 00".into()),
        customer_email: Some("checkout@example.com".into()),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn profile_fields_take_precedence() {
    let identity = FakeIdentity::new();
    let user = identity.add_user(
        "ann@example.com",
        json!({ "full_name": "Ann Petrova", "phone": "+7 111" }),
    );

    let owner = resolve_owner(identity.as_ref(), &order(1, Some(user.id))).await;

    assert_eq!(owner.id, Some(user.id));
    assert_eq!(owner.email.as_deref(), Some("ann@example.com"));
    assert_eq!(owner.name.as_deref(), Some("Ann Petrova"));
    assert_eq!(owner.phone.as_deref(), Some("+7 111"));
}

#[tokio::test]
async fn provider_outage_falls_back_to_order_contact_fields() {
    let identity = FakeIdentity::new();
    let user = identity.add_user("ann@example.com", json!({ "full_name": "Ann" }));
    identity.set_unavailable(true);

    let owner = resolve_owner(identity.as_ref(), &order(1, Some(user.id))).await;

    assert_eq!(owner.id, Some(user.id));
    assert_eq!(owner.email.as_deref(), Some("checkout@example.com"));
    assert_eq!(owner.name.as_deref(), Some("Checkout Name"));
    assert_eq!(owner.phone.as_deref(), Some("+7 900 000 00 00"));
}

#[tokio::test]
async fn unknown_user_id_uses_order_fields() {
    let identity = FakeIdentity::new();
    let stranger = Uuid::new_v4();

    let owner = resolve_owner(identity.as_ref(), &order(1, Some(stranger))).await;

    assert_eq!(owner.id, Some(stranger));
    assert_eq!(owner.name.as_deref(), Some("Checkout Name"));
}

#[tokio::test]
async fn guest_orders_skip_the_lookup() {
    let identity = FakeIdentity::new();

    let owner = resolve_owner(identity.as_ref(), &order(1, None)).await;

    assert_eq!(identity.lookups(), 0);
    assert_eq!(owner.id, None);
    assert_eq!(owner.email.as_deref(), Some("checkout@example.com"));
}

#[tokio::test]
async fn listing_looks_up_each_owner_once() {
    let identity = FakeIdentity::new();
    let ann = identity.add_user("ann@example.com", json!({ "full_name": "Ann" }));
    let bob = identity.add_user("bob@example.com", json!({}));
    let orders = vec![
        order(1, Some(ann.id)),
        order(2, Some(bob.id)),
        order(3, Some(ann.id)),
        order(4, None),
    ];

    let owners = resolve_owners(identity.as_ref(), &orders).await;

    assert_eq!(identity.lookups(), 2);
    assert_eq!(owners.len(), 4);
    assert_eq!(owners[0].name.as_deref(), Some("Ann"));
    assert_eq!(owners[1].name.as_deref(), Some("Checkout Name"));
    assert_eq!(owners[1].email.as_deref(), Some("bob@example.com"));
    assert_eq!(owners[2], owners[0]);
    assert_eq!(owners[3].id, None);
}
