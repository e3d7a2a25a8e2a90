//! Course models

use auth::validation::validate_length;
use common::{DatabaseError, DatabaseResult, database::now_millis};
use mongodb::bson::{Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{Changes, parse_ref};

/// Course entity as stored in the `courses` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default)]
    pub semesters: Vec<String>,
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
pub struct NewCourse {
    pub name: String,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default)]
    pub semesters: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub order: i32,
}

impl NewCourse {
    pub fn into_course(self, created_by: Option<ObjectId>) -> DatabaseResult<Course> {
        validate_length("name", &self.name, 2, 50).map_err(DatabaseError::Validation)?;
        let now = now_millis();

        Ok(Course {
            id: None,
            name: self.name.trim().to_string(),
            streams: self.streams,
            semesters: self.semesters,
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
pub struct UpdateCourse {
    pub name: Option<String>,
    pub streams: Option<Vec<String>>,
    pub semesters: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub order: Option<i32>,
}

impl UpdateCourse {
    pub fn into_set(self) -> DatabaseResult<Document> {
        if let Some(name) = &self.name {
            validate_length("name", name, 2, 50).map_err(DatabaseError::Validation)?;
        }

        Ok(Changes::new()
            .set("name", self.name.map(|n| n.trim().to_string()))
            .set("streams", self.streams)
            .set("semesters", self.semesters)
            .set("tags", self.tags)
            .set_ref("image", self.image.as_deref())?
            .set("order", self.order)
            .into_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_yields_an_empty_set() {
        assert!(UpdateCourse::default().into_set().unwrap().is_empty());
    }

    #[test]
    fn course_round_trips_through_bson() {
        let course = NewCourse {
            name: "B.Sc Physics".to_string(),
            streams: vec!["science".to_string()],
            semesters: vec!["1".to_string(), "2".to_string()],
            tags: vec![],
            image: Some(ObjectId::new().to_hex()),
            order: 1,
        }
        .into_course(None)
        .unwrap();

        let stored = mongodb::bson::to_document(&course).unwrap();
        assert!(!stored.contains_key("_id"));
        let back: Course = mongodb::bson::from_document(stored).unwrap();
        assert_eq!(back, course);
    }
}
