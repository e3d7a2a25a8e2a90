//! Book models

use auth::validation::validate_length;
use common::{DatabaseError, DatabaseResult, database::now_millis};
use mongodb::bson::{Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{Changes, parse_ref};

/// Book entity as stored in the `books` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub course_id: Option<ObjectId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<ObjectId>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    pub created_on: i64,
    pub updated_on: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub name: String,
    #[serde(default)]
    pub publishers: Vec<String>,
    pub course_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub order: i32,
}

impl NewBook {
    pub fn into_book(self, created_by: Option<ObjectId>) -> DatabaseResult<Book> {
        validate_length("name", &self.name, 2, 50).map_err(DatabaseError::Validation)?;
        let now = now_millis();

        Ok(Book {
            id: None,
            name: self.name.trim().to_string(),
            publishers: self.publishers,
            course_id: parse_ref("course_id", self.course_id.as_deref())?,
            tags: self.tags,
            image: parse_ref("image", self.image.as_deref())?,
            order: self.order,
            created_by,
            created_on: now,
            updated_on: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    pub name: Option<String>,
    pub publishers: Option<Vec<String>>,
    pub course_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub order: Option<i32>,
}

impl UpdateBook {
    pub fn into_set(self) -> DatabaseResult<Document> {
        if let Some(name) = &self.name {
            validate_length("name", name, 2, 50).map_err(DatabaseError::Validation)?;
        }

        Ok(Changes::new()
            .set("name", self.name.map(|n| n.trim().to_string()))
            .set("publishers", self.publishers)
            .set_ref("course_id", self.course_id.as_deref())?
            .set("tags", self.tags)
            .set_ref("image", self.image.as_deref())?
            .set("order", self.order)
            .into_document())
    }
}
