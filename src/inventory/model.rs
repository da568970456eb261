use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const UNNAMED_PRODUCT: &str = "Untitled";

/// A sellable product as surfaced to catalog readers.
///
/// Only records with a string id, `allow_to_sell` set and a positive
/// quantity make it this far; see [`normalize_product`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: f64,
    pub group_id: Option<String>,
    pub measure_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

/// Raw product record as the inventory provider returns it. Every field is
/// optional and loosely typed; normalization decides what survives.
#[derive(Debug, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub allow_to_sell: Option<Value>,
    #[serde(default)]
    pub parent_id: Option<Value>,
    #[serde(default)]
    pub measure_name: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawGroup {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
}

/// Uncached view of a single remote product, used when reconciling stock.
/// `quantity` is `None` when the provider sent something non-numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteProduct {
    pub id: String,
    pub quantity: Option<f64>,
}

impl RemoteProduct {
    pub fn from_value(id: &str, raw: &Value) -> Self {
        let raw: RawProduct = serde_json::from_value(raw.clone()).unwrap_or_default();
        let id = raw
            .id
            .as_ref()
            .and_then(non_empty_str)
            .unwrap_or(id)
            .to_string();
        Self {
            id,
            quantity: raw.quantity.as_ref().and_then(as_finite_number),
        }
    }
}

pub fn normalize_product(raw: &Value) -> Option<Product> {
    let raw: RawProduct = serde_json::from_value(raw.clone()).ok()?;

    let id = raw.id.as_ref().and_then(non_empty_str)?.to_string();

    let name = raw
        .name
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNNAMED_PRODUCT)
        .to_string();

    let quantity = raw
        .quantity
        .as_ref()
        .and_then(as_finite_number)
        .unwrap_or(0.0);

    let sellable = match &raw.allow_to_sell {
        None => true,
        Some(v) => is_truthy(v),
    };

    if quantity <= 0.0 || !sellable {
        return None;
    }

    let price = raw
        .price
        .as_ref()
        .and_then(as_finite_number)
        .unwrap_or(0.0)
        .max(0.0);

    Some(Product {
        id,
        name,
        price,
        quantity,
        group_id: raw.parent_id.as_ref().and_then(non_empty_str).map(String::from),
        measure_name: raw
            .measure_name
            .as_ref()
            .and_then(Value::as_str)
            .map(String::from),
    })
}

pub fn normalize_group(raw: &Value) -> Option<Group> {
    let raw: RawGroup = serde_json::from_value(raw.clone()).ok()?;
    let id = raw.id.as_ref().and_then(non_empty_str)?.to_string();
    let name = raw
        .name
        .as_ref()
        .and_then(Value::as_str)
        .map(|n| n.trim().to_string())
        .unwrap_or_default();
    Some(Group { id, name })
}

/// Numbers and numeric strings, rejecting NaN and infinities.
pub fn as_finite_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
