//! Paginated list queries
//!
//! A [`ListQuery`] is decoded from the URL query string of every list
//! endpoint. Entity repositories turn it into a `$match` with [`Filter`],
//! append their enrichment stages, and finish with [`paginate`], which fans
//! the stream out into a `docs` page and a `total` count.

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::{fmt::Display, str::FromStr};

use crate::{
    database::parse_object_id,
    error::DatabaseResult,
    pipeline::{Pipeline, Stage},
};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;

/// Query string shared by all list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub course_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub book_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub paralink: Option<String>,
}

impl ListQuery {
    /// 1-based page, zero falls back to the default
    pub fn page(&self) -> u64 {
        match self.page {
            Some(page) if page > 0 => page,
            _ => DEFAULT_PAGE,
        }
    }

    pub fn limit(&self) -> u64 {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_LIMIT,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn id(&self) -> DatabaseResult<Option<ObjectId>> {
        parse_optional("id", self.id.as_deref())
    }

    pub fn course_id(&self) -> DatabaseResult<Option<ObjectId>> {
        parse_optional("course_id", self.course_id.as_deref())
    }

    pub fn book_id(&self) -> DatabaseResult<Option<ObjectId>> {
        parse_optional("book_id", self.book_id.as_deref())
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn paralink(&self) -> Option<&str> {
        self.paralink.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn parse_optional(field: &str, value: Option<&str>) -> DatabaseResult<Option<ObjectId>> {
    value.map(|v| parse_object_id(field, v)).transpose()
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Which fields a free-text search looks at
#[derive(Debug, Clone, Copy)]
pub struct SearchFields {
    /// String fields matched directly
    pub scalars: &'static [&'static str],
    /// String array fields matched with `$elemMatch`
    pub arrays: &'static [&'static str],
}

impl SearchFields {
    pub const NAME_AND_TAGS: SearchFields = SearchFields {
        scalars: &["name"],
        arrays: &["tags"],
    };
    pub const PUBLISHER: SearchFields = SearchFields {
        scalars: &["publisher"],
        arrays: &[],
    };
    pub const PATH: SearchFields = SearchFields {
        scalars: &["path"],
        arrays: &[],
    };
}

/// Builder for the leading `$match` of a list pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.0.insert(field, value.into());
        self
    }

    pub fn eq_opt<V: Into<Bson>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    /// Case-insensitive substring match, OR-ed across `fields`
    pub fn search(mut self, term: Option<&str>, fields: SearchFields) -> Self {
        let Some(term) = term else {
            return self;
        };
        let pattern = regex::escape(term);

        let mut clauses: Vec<Bson> = Vec::new();
        for field in fields.scalars {
            let mut clause = Document::new();
            clause.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
            clauses.push(clause.into());
        }
        for field in fields.arrays {
            let mut clause = Document::new();
            clause.insert(
                *field,
                doc! { "$elemMatch": { "$regex": pattern.as_str(), "$options": "i" } },
            );
            clauses.push(clause.into());
        }

        if !clauses.is_empty() {
            self.0.insert("$or", clauses);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_document(self) -> Document {
        self.0
    }

    pub fn into_stage(self) -> Stage {
        Stage::Match(self.0)
    }
}

/// Sort on `field`, breaking ties on `_id` in the same direction
pub fn sort_by(field: &str, ascending: bool) -> Document {
    let direction = if ascending { 1 } else { -1 };
    let mut sort = Document::new();
    sort.insert(field, direction);
    if field != "_id" {
        sort.insert("_id", direction);
    }
    sort
}

/// Append the `docs`/`total` fan-out to a filtered and enriched pipeline
pub fn paginate(pipeline: Pipeline, sort: Document, query: &ListQuery) -> Pipeline {
    pipeline.stage(Stage::Facet(vec![
        (
            "docs".to_string(),
            vec![
                Stage::Sort(sort),
                Stage::Skip(query.skip()),
                Stage::Limit(query.limit()),
            ],
        ),
        ("total".to_string(), vec![Stage::Count("count".to_string())]),
    ]))
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total: Total,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Total {
    pub count: i64,
}

#[derive(Deserialize)]
struct FacetOutput<T> {
    #[serde(default = "Vec::new")]
    docs: Vec<T>,
    #[serde(default)]
    total: Vec<Total>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            docs: Vec::new(),
            total: Total::default(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode the single document a `$facet` stage yields.
    ///
    /// The count branch is empty when nothing matched; that becomes `{count: 0}`.
    pub fn from_facet(output: Option<Document>) -> DatabaseResult<Self> {
        let Some(output) = output else {
            return Ok(Self::empty());
        };
        let facet: FacetOutput<T> = mongodb::bson::from_document(output)?;

        Ok(Self {
            docs: facet.docs,
            total: facet.total.into_iter().next().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<u64>, limit: Option<u64>) -> ListQuery {
        ListQuery {
            page,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn paging_defaults() {
        let q = query(None, None);
        assert_eq!((q.page(), q.limit(), q.skip()), (1, 20, 0));

        let q = query(Some(0), Some(0));
        assert_eq!((q.page(), q.limit(), q.skip()), (1, 20, 0));

        let q = query(Some(3), Some(10));
        assert_eq!(q.skip(), 20);
    }

    #[test]
    fn malformed_id_is_a_validation_failure() {
        let q = ListQuery {
            id: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(q.id().unwrap_err().is_client_error());
    }

    #[test]
    fn search_escapes_the_term_and_covers_name_and_tags() {
        let filter = Filter::new()
            .search(Some("c++ (intro)"), SearchFields::NAME_AND_TAGS)
            .into_document();

        let escaped = regex::escape("c++ (intro)");
        assert_eq!(
            filter,
            doc! {
                "$or": [
                    { "name": { "$regex": escaped.as_str(), "$options": "i" } },
                    { "tags": { "$elemMatch": { "$regex": escaped.as_str(), "$options": "i" } } },
                ]
            }
        );
    }

    #[test]
    fn blank_search_is_ignored() {
        let q = ListQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(Filter::new().search(q.search(), SearchFields::PATH).is_empty());
    }

    #[test]
    fn sort_breaks_ties_on_id() {
        assert_eq!(sort_by("order", true), doc! { "order": 1, "_id": 1 });
        assert_eq!(sort_by("_id", false), doc! { "_id": -1 });
    }

    #[test]
    fn paginate_appends_a_two_branch_facet() {
        let pipeline = paginate(
            Pipeline::new().stage(Filter::new().into_stage()),
            sort_by("order", true),
            &query(Some(2), Some(5)),
        );

        let docs = pipeline.into_documents();
        assert_eq!(
            docs.last().cloned(),
            Some(doc! {
                "$facet": {
                    "docs": [
                        { "$sort": { "order": 1, "_id": 1 } },
                        { "$skip": 5_i64 },
                        { "$limit": 5_i64 },
                    ],
                    "total": [ { "$count": "count" } ],
                }
            })
        );
    }

    #[test]
    fn empty_count_branch_becomes_zero() {
        let page: Page<Document> =
            Page::from_facet(Some(doc! { "docs": [], "total": [] })).unwrap();
        assert_eq!(page, Page::empty());

        let page: Page<Document> = Page::from_facet(None).unwrap();
        assert_eq!(page.total.count, 0);
    }

    #[test]
    fn facet_output_decodes_docs_and_count() {
        let page: Page<Document> = Page::from_facet(Some(doc! {
            "docs": [ { "name": "Algebra I" } ],
            "total": [ { "count": 7 } ],
        }))
        .unwrap();

        assert_eq!(page.docs.len(), 1);
        assert_eq!(page.total.count, 7);
    }

    #[test]
    fn empty_query_values_are_absent() {
        let q: ListQuery = serde_json::from_value(serde_json::json!({
            "page": "",
            "limit": "15",
            "search": "",
        }))
        .unwrap();

        assert_eq!(q.page, None);
        assert_eq!(q.limit, Some(15));
        assert_eq!(q.search, None);
    }
}
