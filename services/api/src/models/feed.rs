//! Feed models
//!
//! A feed is an ordered list of sections shown on a landing screen. Sections
//! point at a book, a course or an image, or nest further sections under
//! `options`, so the tree can be arbitrarily deep.

use auth::validation::validate_length;
use common::{DatabaseError, DatabaseResult, database::now_millis};
use mongodb::bson::{self, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{Changes, parse_ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    Sections,
    Courses,
    Books,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Paralink,
    Course,
    Book,
    Options,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paralink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SectionOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOptions {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Feed entity as stored in the `feeds` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub feed_type: Option<FeedType>,
    /// Layout hint such as `banner` or `2colgrid`
    #[serde(default)]
    pub view_type: String,
    #[serde(default)]
    pub linked: String,
    pub paralink: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    pub created_on: i64,
    pub updated_on: i64,
}

/// Section as sent by clients, references are hex ids
#[derive(Debug, Clone, Deserialize)]
pub struct NewSection {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: Option<SectionType>,
    pub paralink: Option<String>,
    pub image: Option<String>,
    pub course: Option<String>,
    pub book: Option<String>,
    pub options: Option<NewSectionOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSectionOptions {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<NewSection>,
}

impl NewSection {
    fn into_section(self) -> DatabaseResult<Section> {
        let options = match self.options {
            Some(options) => Some(SectionOptions {
                title: options.title,
                sections: into_sections(options.sections)?,
            }),
            None => None,
        };

        Ok(Section {
            title: self.title,
            section_type: self.section_type,
            paralink: self.paralink.filter(|p| !p.trim().is_empty()),
            image: parse_ref("sections.image", self.image.as_deref())?,
            course: parse_ref("sections.course", self.course.as_deref())?,
            book: parse_ref("sections.book", self.book.as_deref())?,
            options,
        })
    }
}

fn into_sections(sections: Vec<NewSection>) -> DatabaseResult<Vec<Section>> {
    sections.into_iter().map(NewSection::into_section).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFeed {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub feed_type: Option<FeedType>,
    #[serde(default)]
    pub view_type: String,
    #[serde(default)]
    pub linked: String,
    pub paralink: String,
    #[serde(default)]
    pub sections: Vec<NewSection>,
    #[serde(default)]
    pub order: i32,
}

impl NewFeed {
    pub fn into_feed(self, created_by: Option<ObjectId>) -> DatabaseResult<Feed> {
        validate_length("name", &self.name, 2, 50).map_err(DatabaseError::Validation)?;
        validate_length("paralink", &self.paralink, 2, 50).map_err(DatabaseError::Validation)?;
        let now = now_millis();

        Ok(Feed {
            id: None,
            name: self.name.trim().to_string(),
            title: self.title,
            feed_type: self.feed_type,
            view_type: self.view_type,
            linked: self.linked,
            paralink: self.paralink.trim().to_string(),
            sections: into_sections(self.sections)?,
            order: self.order,
            created_by,
            created_on: now,
            updated_on: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFeed {
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub feed_type: Option<FeedType>,
    pub view_type: Option<String>,
    pub linked: Option<String>,
    pub paralink: Option<String>,
    pub sections: Option<Vec<NewSection>>,
    pub order: Option<i32>,
}

impl UpdateFeed {
    pub fn into_set(self) -> DatabaseResult<Document> {
        if let Some(name) = &self.name {
            validate_length("name", name, 2, 50).map_err(DatabaseError::Validation)?;
        }
        if let Some(paralink) = &self.paralink {
            validate_length("paralink", paralink, 2, 50).map_err(DatabaseError::Validation)?;
        }

        let sections = match self.sections {
            Some(sections) => Some(bson::to_bson(&into_sections(sections)?)?),
            None => None,
        };
        let feed_type = match self.feed_type {
            Some(feed_type) => Some(bson::to_bson(&feed_type)?),
            None => None,
        };

        Ok(Changes::new()
            .set("name", self.name.map(|n| n.trim().to_string()))
            .set("title", self.title)
            .set("type", feed_type)
            .set("view_type", self.view_type)
            .set("linked", self.linked)
            .set("paralink", self.paralink.map(|p| p.trim().to_string()))
            .set("sections", sections)
            .set("order", self.order)
            .into_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_sections_are_converted_recursively() {
        let book = ObjectId::new();
        let feed: NewFeed = serde_json::from_value(json!({
            "name": "Home",
            "type": "sections",
            "view_type": "banner",
            "paralink": "home",
            "sections": [
                { "title": "Top", "type": "book", "book": book.to_hex() },
                {
                    "title": "More",
                    "type": "options",
                    "options": {
                        "title": "Pick one",
                        "sections": [ { "title": "Deep", "type": "paralink", "paralink": "deep" } ]
                    }
                }
            ]
        }))
        .unwrap();

        let feed = feed.into_feed(None).unwrap();
        assert_eq!(feed.sections[0].book, Some(book));
        let options = feed.sections[1].options.as_ref().unwrap();
        assert_eq!(options.sections[0].paralink.as_deref(), Some("deep"));
    }

    #[test]
    fn bad_nested_reference_names_the_field() {
        let feed: NewFeed = serde_json::from_value(json!({
            "name": "Home",
            "paralink": "home",
            "sections": [ { "options": { "sections": [ { "course": "bogus" } ] } } ]
        }))
        .unwrap();

        let err = feed.into_feed(None).unwrap_err();
        assert!(err.to_string().contains("sections.course"));
    }

    #[test]
    fn paralink_is_required() {
        let feed: NewFeed = serde_json::from_value(json!({ "name": "Home", "paralink": "" })).unwrap();
        assert!(feed.into_feed(None).unwrap_err().is_client_error());
    }

    #[test]
    fn stored_sections_omit_missing_references() {
        let section = Section {
            title: "Top".to_string(),
            section_type: Some(SectionType::Paralink),
            paralink: Some("top".to_string()),
            image: None,
            course: None,
            book: None,
            options: None,
        };
        let stored = bson::to_document(&section).unwrap();
        assert_eq!(stored.keys().count(), 3);
        assert_eq!(stored.get_str("type").unwrap(), "paralink");
    }
}
