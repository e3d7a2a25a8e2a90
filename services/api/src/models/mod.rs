//! Catalog models for request and response payloads
//!
//! Stored models use `ObjectId` references. Request payloads carry ids as hex
//! strings and are converted with [`parse_ref`], so a bad id surfaces as a
//! validation error naming the field.

use common::{DatabaseResult, database::parse_object_id};
use mongodb::bson::{Bson, Document, oid::ObjectId};

pub mod book;
pub mod cart_item;
pub mod course;
pub mod feed;
pub mod media;
pub mod order;
pub mod stock;

pub use book::{Book, NewBook, UpdateBook};
pub use cart_item::{CartItem, NewCartItem, UpdateCartItem};
pub use course::{Course, NewCourse, UpdateCourse};
pub use feed::{
    Feed, FeedType, NewFeed, NewSection, NewSectionOptions, Section, SectionOptions, SectionType,
    UpdateFeed,
};
pub use media::{Media, MediaResponse};
pub use order::{Order, OrderItem};
pub use stock::{NewStock, Stock, StockStatus, UpdateStock};

/// Parse an optional hex id from a request payload
pub fn parse_ref(field: &str, value: Option<&str>) -> DatabaseResult<Option<ObjectId>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_object_id(field, value).map(Some),
    }
}

/// Accumulates the `$set` document of a partial update
#[derive(Debug, Default)]
pub struct Changes(Document);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<V: Into<Bson>>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.0.insert(field, value.into());
        }
        self
    }

    pub fn set_ref(self, field: &str, value: Option<&str>) -> DatabaseResult<Self> {
        Ok(self.set(field, parse_ref(field, value)?))
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_refs_are_absent() {
        assert_eq!(parse_ref("image", None).unwrap(), None);
        assert_eq!(parse_ref("image", Some(" ")).unwrap(), None);
        assert!(parse_ref("image", Some("xyz")).is_err());
    }

    #[test]
    fn changes_skip_missing_values() {
        let id = ObjectId::new();
        let set = Changes::new()
            .set("name", Some("Algebra"))
            .set::<i32>("order", None)
            .set_ref("course_id", Some(&id.to_hex()))
            .unwrap()
            .into_document();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get_object_id("course_id").unwrap(), id);
    }
}
