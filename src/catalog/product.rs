//! Decoding queued products and shaping table rows.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::table::{TableItem, TableValue};
use crate::validation::{CandidateProduct, ValidProduct};

/// Attribute names of the catalog table.
pub mod catalog_attrs {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const PRICE: &str = "price";
    pub const DESCRIPTION: &str = "description";
}

/// Attribute names of the stock table.
pub mod stock_attrs {
    pub const PRODUCT_ID: &str = "product_id";
    pub const COUNT: &str = "count";
}

/// Decode a message body into a candidate.
///
/// An empty body reads as `{}`. Valid JSON that is not an object yields a
/// candidate with every field absent. Malformed JSON is an error.
pub fn decode_candidate(body: &str) -> serde_json::Result<CandidateProduct> {
    let value: Value = if body.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(body)?
    };

    let empty = Map::new();
    let fields = value.as_object().unwrap_or(&empty);

    Ok(CandidateProduct {
        name: text(fields.get("name")),
        description: text(fields.get("description")),
        price: coerce_number(fields.get("price")),
        count: coerce_number(fields.get("count")),
    })
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        // Non-string JSON is kept as its JSON text.
        other => Some(other.to_string()),
    }
}

/// Numeric coercion: numbers as-is, trimmed decimal strings parsed, booleans
/// as 1/0, null as 0. Everything else, blank strings included, is NaN.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                f64::NAN
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) => 0.0,
        Some(Value::Array(_)) | Some(Value::Object(_)) | None => f64::NAN,
    }
}

/// A validated product with its assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistableProduct {
    pub id: Uuid,
    #[serde(flatten)]
    pub product: ValidProduct,
}

impl PersistableProduct {
    pub fn new(id: Uuid, product: ValidProduct) -> Self {
        Self { id, product }
    }

    pub fn name(&self) -> &str {
        &self.product.name
    }

    /// Catalog row: id, name, price and, when present, description.
    pub fn catalog_item(&self) -> TableItem {
        let mut item = TableItem::new();
        item.insert(catalog_attrs::ID.to_string(), TableValue::string(self.id.to_string()));
        item.insert(catalog_attrs::NAME.to_string(), TableValue::string(&self.product.name));
        item.insert(catalog_attrs::PRICE.to_string(), TableValue::number(self.product.price));
        if let Some(description) = &self.product.description {
            item.insert(
                catalog_attrs::DESCRIPTION.to_string(),
                TableValue::string(description),
            );
        }
        item
    }

    /// Stock row, joined to the catalog row by id.
    pub fn stock_item(&self) -> TableItem {
        TableItem::from([
            (
                stock_attrs::PRODUCT_ID.to_string(),
                TableValue::string(self.id.to_string()),
            ),
            (stock_attrs::COUNT.to_string(), TableValue::number(self.product.count)),
        ])
    }
}
