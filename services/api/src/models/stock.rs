//! Stock models
//!
//! A stock is one purchasable copy of a book edition. Only `available`
//! stocks take part in the availability summary attached to books.

use common::{DatabaseError, DatabaseResult, database::now_millis};
use mongodb::bson::{Bson, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{Changes, parse_ref};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    #[default]
    Available,
    Sold,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Available => "available",
            StockStatus::Sold => "sold",
        }
    }
}

impl From<StockStatus> for Bson {
    fn from(status: StockStatus) -> Self {
        Bson::String(status.as_str().to_string())
    }
}

/// Stock entity as stored in the `stocks` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub book_id: ObjectId,
    #[serde(default)]
    pub course_id: Option<ObjectId>,
    pub publisher: String,
    pub year: String,
    pub price: i64,
    #[serde(default)]
    pub discount_percent: i32,
    #[serde(default)]
    pub status: StockStatus,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    pub created_on: i64,
    pub updated_on: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStock {
    pub book_id: String,
    pub course_id: Option<String>,
    pub publisher: String,
    pub year: String,
    pub price: i64,
    #[serde(default)]
    pub discount_percent: i32,
    pub status: Option<StockStatus>,
}

fn validate_year(year: &str) -> DatabaseResult<()> {
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(DatabaseError::Validation(
            "year must be exactly 4 digits".to_string(),
        ));
    }
    Ok(())
}

fn validate_price(price: i64) -> DatabaseResult<()> {
    if price <= 0 {
        return Err(DatabaseError::Validation(
            "price must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_discount(discount_percent: i32) -> DatabaseResult<()> {
    if !(0..=100).contains(&discount_percent) {
        return Err(DatabaseError::Validation(
            "discount_percent must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

impl NewStock {
    pub fn into_stock(self, created_by: Option<ObjectId>) -> DatabaseResult<Stock> {
        let book_id = parse_ref("book_id", Some(&self.book_id))?
            .ok_or_else(|| DatabaseError::Validation("book_id is required".to_string()))?;
        auth::validation::validate_length("publisher", &self.publisher, 2, 50)
            .map_err(DatabaseError::Validation)?;
        validate_year(self.year.trim())?;
        validate_price(self.price)?;
        validate_discount(self.discount_percent)?;
        let now = now_millis();

        Ok(Stock {
            id: None,
            book_id,
            course_id: parse_ref("course_id", self.course_id.as_deref())?,
            publisher: self.publisher.trim().to_string(),
            year: self.year.trim().to_string(),
            price: self.price,
            discount_percent: self.discount_percent,
            status: self.status.unwrap_or_default(),
            created_by,
            created_on: now,
            updated_on: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStock {
    pub book_id: Option<String>,
    pub course_id: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub price: Option<i64>,
    pub discount_percent: Option<i32>,
    pub status: Option<StockStatus>,
}

impl UpdateStock {
    pub fn into_set(self) -> DatabaseResult<Document> {
        if let Some(year) = &self.year {
            validate_year(year.trim())?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(discount_percent) = self.discount_percent {
            validate_discount(discount_percent)?;
        }

        Ok(Changes::new()
            .set_ref("book_id", self.book_id.as_deref())?
            .set_ref("course_id", self.course_id.as_deref())?
            .set("publisher", self.publisher.map(|p| p.trim().to_string()))
            .set("year", self.year.map(|y| y.trim().to_string()))
            .set("price", self.price)
            .set("discount_percent", self.discount_percent)
            .set("status", self.status)
            .into_document())
    }
}
