//! Order models
//!
//! Orders are stored by the checkout flow of the mobile client; the API
//! does not expose routes for them.

use common::database::now_millis;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const ORDER_STATUS_CREATED: &str = "created";
pub const PAYMENT_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub book_id: ObjectId,
    pub stock_id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub discount_percent: i32,
    #[serde(default)]
    pub discount_price: i64,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub payment_order_id: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_payment_status")]
    pub payment_status: String,
    #[serde(default)]
    pub payment_mode: String,
    pub created_on: i64,
    pub updated_on: i64,
}

fn default_status() -> String {
    ORDER_STATUS_CREATED.to_string()
}

fn default_payment_status() -> String {
    PAYMENT_STATUS_PENDING.to_string()
}

impl Order {
    /// A fresh order in the `created` state awaiting payment
    pub fn new(order_type: impl Into<String>, items: Vec<OrderItem>, created_by: ObjectId) -> Self {
        let now = now_millis();
        Self {
            id: None,
            order_type: order_type.into(),
            items,
            publisher: String::new(),
            year: String::new(),
            price: 0,
            discount_percent: 0,
            discount_price: 0,
            created_by: Some(created_by),
            payment_id: String::new(),
            payment_order_id: String::new(),
            status: default_status(),
            payment_status: default_payment_status(),
            payment_mode: String::new(),
            created_on: now,
            updated_on: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn new_orders_await_payment() {
        let order = Order::new("book", vec![], ObjectId::new());
        assert_eq!(order.status, "created");
        assert_eq!(order.payment_status, "pending");
    }

    #[test]
    fn stored_orders_without_status_get_defaults() {
        let order: Order = mongodb::bson::from_document(doc! {
            "type": "book",
            "created_on": 1_i64,
            "updated_on": 1_i64,
        })
        .unwrap();
        assert_eq!(order.status, ORDER_STATUS_CREATED);
        assert_eq!(order.payment_status, PAYMENT_STATUS_PENDING);
    }
}
