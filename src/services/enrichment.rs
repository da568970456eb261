use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    identity::{IdentityProvider, IdentityUser},
    models::{Order, OrderUser},
};

/// Builds the owner snapshot for `order`. Each field independently prefers
/// the looked-up profile, then the contact fields captured on the order; the
/// display name finally falls back to whichever email is known.
pub fn owner_snapshot(order: &Order, profile: Option<&IdentityUser>) -> OrderUser {
    let profile_email = profile.and_then(|p| non_blank(p.email.as_deref()));
    let order_email = non_blank(order.customer_email.as_deref());

    let name = profile
        .and_then(|p| non_blank(p.user_metadata.full_name.as_deref()))
        .or_else(|| non_blank(order.customer_name.as_deref()))
        .or_else(|| profile_email.clone())
        .or_else(|| order_email.clone());

    let phone = profile
        .and_then(|p| non_blank(p.user_metadata.phone.as_deref()))
        .or_else(|| non_blank(order.customer_phone.as_deref()));

    OrderUser {
        id: profile.map(|p| p.id).or(order.user_id),
        email: profile_email.or(order_email),
        name,
        phone,
    }
}

/// Never fails: an unreachable identity provider degrades to the order's own
/// contact fields.
pub async fn resolve_owner(identity: &dyn IdentityProvider, order: &Order) -> OrderUser {
    let profile = match order.user_id {
        Some(user_id) => lookup(identity, user_id).await,
        None => None,
    };
    owner_snapshot(order, profile.as_ref())
}

/// Resolves owners for a listing, looking each distinct user up once.
pub async fn resolve_owners(identity: &dyn IdentityProvider, orders: &[Order]) -> Vec<OrderUser> {
    let mut profiles: HashMap<Uuid, Option<IdentityUser>> = HashMap::new();
    let mut owners = Vec::with_capacity(orders.len());

    for order in orders {
        let profile = match order.user_id {
            Some(user_id) => {
                if !profiles.contains_key(&user_id) {
                    let found = lookup(identity, user_id).await;
                    profiles.insert(user_id, found);
                }
                profiles.get(&user_id).and_then(Option::as_ref)
            }
            None => None,
        };
        owners.push(owner_snapshot(order, profile));
    }

    owners
}

async fn lookup(identity: &dyn IdentityProvider, user_id: Uuid) -> Option<IdentityUser> {
    match identity.user_by_id(user_id).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(%user_id, error = %err, "profile lookup failed, using order contact fields");
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
