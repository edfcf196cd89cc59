//! The summary published after each persisted batch.

use serde::Serialize;

use super::PersistableProduct;
use crate::topic::Notification;

pub const SUMMARY_MESSAGE: &str = "Products created successfully";
pub const SUBJECT: &str = "Products created";

/// Attribute listing every product name in the batch.
pub const NEW_PRODUCTS_ATTR: &str = "newProductsAdded";
/// Attribute listing products below the low-stock threshold. Absent when
/// there are none.
pub const LOW_STOCK_ATTR: &str = "lowStockProducts";

#[derive(Serialize)]
struct Summary<'a> {
    message: &'static str,
    products: &'a [PersistableProduct],
}

/// Names of products with fewer than `threshold` units, in batch order.
pub fn low_stock_names(products: &[PersistableProduct], threshold: u64) -> Vec<&str> {
    products
        .iter()
        .filter(|p| p.product.count < threshold)
        .map(PersistableProduct::name)
        .collect()
}

/// Build the summary notification for a persisted batch.
pub fn build_notification(
    products: &[PersistableProduct],
    low_stock_threshold: u64,
) -> serde_json::Result<Notification> {
    let body = serde_json::to_string(&Summary {
        message: SUMMARY_MESSAGE,
        products,
    })?;

    let names: Vec<&str> = products.iter().map(PersistableProduct::name).collect();
    let mut notification = Notification::new(body)
        .with_subject(SUBJECT)
        .with_attribute(NEW_PRODUCTS_ATTR, names.join(", "));

    let low_stock = low_stock_names(products, low_stock_threshold);
    if !low_stock.is_empty() {
        notification = notification.with_attribute(LOW_STOCK_ATTR, low_stock.join(", "));
    }

    Ok(notification)
}
