use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderResult, UpdateOrderRequest},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    identity::IdentityUser,
    middleware::auth::{AuthUser, ensure_admin},
    models::{
        Order, OrderItem, OrderShippingAddress, OrderStatus, PaymentStatus, items_from_json,
        shipping_from_json,
    },
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{
        enrichment::{owner_snapshot, resolve_owner, resolve_owners},
        reconciliation::{aggregate_decrements, reconcile, should_reconcile},
    },
    state::AppState,
};

pub const DEFAULT_ADDRESS_TITLE: &str = "Delivery address";

/// Validated checkout, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: Option<uuid::Uuid>,
    pub currency: String,
    pub total_cost: i64,
    pub items: Vec<OrderItem>,
    pub shipping_address: OrderShippingAddress,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

/// Checks a checkout payload and fills contact fields from the signed-in
/// user where the payload leaves them out. Guests must give a name and phone.
pub fn prepare_order(
    user: Option<&IdentityUser>,
    payload: CreateOrderRequest,
    default_currency: &str,
) -> AppResult<NewOrder> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Cannot create an order without items".into()));
    }

    let metadata = user.map(|u| &u.user_metadata);
    let customer_name = first_non_blank([
        payload.customer_name.as_deref(),
        metadata.and_then(|m| m.full_name.as_deref()),
    ]);
    let customer_phone = first_non_blank([
        payload.customer_phone.as_deref(),
        metadata.and_then(|m| m.phone.as_deref()),
    ]);
    let customer_email = first_non_blank([
        payload.customer_email.as_deref(),
        user.and_then(|u| u.email.as_deref()),
    ]);

    if user.is_none() && (customer_name.is_none() || customer_phone.is_none()) {
        return Err(AppError::BadRequest(
            "Name and phone are required to place an order".into(),
        ));
    }

    let mut shipping_address = payload.shipping_address;
    if shipping_address.address.trim().is_empty() {
        return Err(AppError::BadRequest("Shipping address is required".into()));
    }
    if shipping_address.title.trim().is_empty() {
        shipping_address.title = DEFAULT_ADDRESS_TITLE.to_string();
    }

    let total_cost = payload
        .items
        .iter()
        .map(|item| item.price.saturating_mul(item.quantity))
        .fold(0i64, i64::saturating_add);

    let currency = payload
        .currency
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| default_currency.to_string());

    Ok(NewOrder {
        user_id: user.map(|u| u.id),
        currency,
        total_cost,
        items: payload.items,
        shipping_address,
        customer_name,
        customer_phone,
        customer_email,
    })
}

pub async fn create_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderResult>> {
    let identity = user.map(|u| &u.user);
    let new_order = prepare_order(identity, payload, &state.config.default_currency)?;

    let model = OrderActive {
        id: NotSet,
        user_id: Set(new_order.user_id),
        status: Set(OrderStatus::PendingReview.as_str().to_string()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().to_string()),
        currency: Set(new_order.currency),
        total_cost: Set(new_order.total_cost),
        items: Set(to_json(&new_order.items)?),
        shipping_address: Set(Some(to_json(&new_order.shipping_address)?)),
        tracking_code: Set(None),
        customer_name: Set(new_order.customer_name),
        customer_phone: Set(new_order.customer_phone),
        customer_email: Set(new_order.customer_email),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let order = order_from_entity(model);
    tracing::info!(order_id = order.id, guest = user.is_none(), total = order.total_cost, "order created");

    audit::record(
        &state.pool,
        order.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_cost": order.total_cost }),
    )
    .await;

    let owner = owner_snapshot(&order, identity);
    Ok(ApiResponse::success(
        "Order created",
        OrderResult::new(order, owner),
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id()));
    list_orders(state, condition, query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(state, user).await?;
    list_orders(state, Condition::all(), query).await
}

async fn list_orders(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.normalize();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders: Vec<Order> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let owners = resolve_owners(state.identity.as_ref(), &orders).await;
    let items = orders
        .into_iter()
        .zip(owners)
        .map(|(order, owner)| OrderResult::new(order, owner))
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Admin update. When the status moves into `approved`, remote stock is
/// decremented for the order's items after the row is saved. The write is
/// conditional on the status read just before, so two racing approvals
/// cannot both decrement.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderResult>> {
    ensure_admin(state, user).await?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let mut reconcile_stock = false;
    let mut expected_status: Option<String> = None;
    if payload.status.is_some() {
        let current = Orders::find_by_id(id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        let previous: OrderStatus = current.status.parse().unwrap_or_default();
        reconcile_stock = should_reconcile(previous, payload.status);
        if reconcile_stock {
            expected_status = Some(current.status);
        }
    }

    let mut update = Orders::update_many().filter(OrderCol::Id.eq(id));
    if let Some(status) = payload.status {
        update = update.col_expr(OrderCol::Status, Expr::value(status.as_str()));
    }
    if let Some(payment_status) = payload.payment_status {
        update = update.col_expr(OrderCol::PaymentStatus, Expr::value(payment_status.as_str()));
    }
    if let Some(currency) = payload.currency {
        update = update.col_expr(OrderCol::Currency, Expr::value(currency));
    }
    if let Some(total_cost) = payload.total_cost {
        update = update.col_expr(OrderCol::TotalCost, Expr::value(total_cost));
    }
    if let Some(items) = &payload.items {
        update = update.col_expr(OrderCol::Items, Expr::value(to_json(items)?));
    }
    if let Some(shipping) = &payload.shipping_address {
        update = update.col_expr(OrderCol::ShippingAddress, Expr::value(to_json(shipping)?));
    }
    if let Some(tracking_code) = payload.tracking_code {
        update = update.col_expr(OrderCol::TrackingCode, Expr::value(tracking_code));
    }
    if let Some(expected) = &expected_status {
        update = update.filter(OrderCol::Status.eq(expected.as_str()));
    }

    let result = update.exec(&state.orm).await?;
    if result.rows_affected == 0 {
        if expected_status.is_some() {
            tracing::warn!(order_id = id, "order status changed concurrently, approval not applied");
            return Err(AppError::Conflict(
                "Order status changed concurrently, reload and retry".into(),
            ));
        }
        return Err(AppError::NotFound);
    }

    let model = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order {id} missing after update")))?;
    let raw_items = model.items.clone();
    let order = order_from_entity(model);

    audit::record(
        &state.pool,
        Some(user.user_id()),
        "order_update",
        "orders",
        serde_json::json!({ "order_id": id, "status": order.status.as_str() }),
    )
    .await;

    if reconcile_stock {
        let adjustments = aggregate_decrements(&raw_items);
        tracing::info!(order_id = id, products = adjustments.len(), "order approved, reconciling stock");
        let report = reconcile(&state.inventory, adjustments).await;

        audit::record(
            &state.pool,
            Some(user.user_id()),
            "inventory_sync",
            "orders",
            serde_json::json!({ "order_id": id, "complete": report.is_complete(), "report": &report }),
        )
        .await;

        if !report.is_complete() {
            return Err(AppError::InventorySync {
                order_id: id,
                report,
            });
        }
    }

    let owner = resolve_owner(state.identity.as_ref(), &order).await;
    Ok(ApiResponse::success(
        "Order updated",
        OrderResult::new(order, owner),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(state: &AppState, user: &AuthUser, id: i64) -> AppResult<()> {
    ensure_admin(state, user).await?;
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id()),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;
    Ok(())
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status.parse().unwrap_or_default(),
        payment_status: model.payment_status.parse().unwrap_or_default(),
        currency: model.currency,
        total_cost: model.total_cost,
        items: items_from_json(&model.items),
        shipping_address: shipping_from_json(model.shipping_address.as_ref()),
        tracking_code: model.tracking_code,
        customer_name: model.customer_name,
        customer_phone: model.customer_phone,
        customer_email: model.customer_email,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn first_non_blank<const N: usize>(candidates: [Option<&str>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(String::from)
}
