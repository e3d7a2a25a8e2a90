//! Cart item models

use common::{DatabaseError, DatabaseResult, database::now_millis};
use mongodb::bson::{Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{Changes, parse_ref};

fn default_quantity() -> i32 {
    1
}

/// Cart item as stored in the `cart_items` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub book_id: ObjectId,
    #[serde(default)]
    pub course_id: Option<ObjectId>,
    #[serde(default)]
    pub stock_id: Option<ObjectId>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub discount_percent: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    pub created_on: i64,
    pub updated_on: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCartItem {
    /// Honoured for admins only, a user always adds to their own cart
    pub user_id: Option<String>,
    pub book_id: String,
    pub course_id: Option<String>,
    pub stock_id: Option<String>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub discount_percent: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn validate_quantity(quantity: i32) -> DatabaseResult<()> {
    if quantity < 1 {
        return Err(DatabaseError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

impl NewCartItem {
    /// Build the stored item for `owner`, the acting user unless an admin named another
    pub fn into_cart_item(self, owner: ObjectId, created_by: ObjectId) -> DatabaseResult<CartItem> {
        let book_id = parse_ref("book_id", Some(&self.book_id))?
            .ok_or_else(|| DatabaseError::Validation("book_id is required".to_string()))?;
        validate_quantity(self.quantity)?;
        let now = now_millis();

        Ok(CartItem {
            id: None,
            user_id: owner,
            book_id,
            course_id: parse_ref("course_id", self.course_id.as_deref())?,
            stock_id: parse_ref("stock_id", self.stock_id.as_deref())?,
            publisher: self.publisher.trim().to_string(),
            year: self.year.trim().to_string(),
            price: self.price,
            discount_percent: self.discount_percent,
            quantity: self.quantity,
            created_by: Some(created_by),
            created_on: now,
            updated_on: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCartItem {
    pub book_id: Option<String>,
    pub course_id: Option<String>,
    pub stock_id: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub price: Option<i64>,
    pub discount_percent: Option<i32>,
    pub quantity: Option<i32>,
}

impl UpdateCartItem {
    pub fn into_set(self) -> DatabaseResult<Document> {
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }

        Ok(Changes::new()
            .set_ref("book_id", self.book_id.as_deref())?
            .set_ref("course_id", self.course_id.as_deref())?
            .set_ref("stock_id", self.stock_id.as_deref())?
            .set("publisher", self.publisher)
            .set("year", self.year)
            .set("price", self.price)
            .set("discount_percent", self.discount_percent)
            .set("quantity", self.quantity)
            .into_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_defaults_to_one() {
        let item: NewCartItem = serde_json::from_value(serde_json::json!({
            "book_id": ObjectId::new().to_hex(),
        }))
        .unwrap();
        assert_eq!(item.quantity, 1);

        let user = ObjectId::new();
        let stored = item.into_cart_item(user, user).unwrap();
        assert_eq!(stored.user_id, user);
        assert_eq!(stored.quantity, 1);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let update = UpdateCartItem {
            quantity: Some(0),
            ..Default::default()
        };
        assert!(update.into_set().unwrap_err().is_client_error());
    }
}
