//! Typed aggregation pipeline stages
//!
//! Pipelines are assembled from [`Stage`] values and rendered to BSON only
//! when they are handed to the driver, so every builder in the workspace can
//! be unit tested without a database.

use mongodb::bson::{Bson, Document, doc};

/// One aggregation stage
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Document),
    Lookup(Lookup),
    Unwind(Unwind),
    AddFields(Document),
    Group(Document),
    Facet(Vec<(String, Vec<Stage>)>),
    Sort(Document),
    Skip(u64),
    Limit(u64),
    Count(String),
}

/// Correlated `$lookup` with a sub-pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: String,
    pub vars: Document,
    pub pipeline: Vec<Stage>,
    pub as_field: String,
}

/// `$unwind` with its options
#[derive(Debug, Clone, PartialEq)]
pub struct Unwind {
    pub path: String,
    pub preserve_null_and_empty_arrays: bool,
    pub include_array_index: Option<String>,
}

impl Lookup {
    /// Join documents of `from` whose `foreign_field` equals the parent's `local_field`.
    pub fn correlated(from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Self {
        Self {
            from: from.to_string(),
            vars: doc! { "key": format!("${}", local_field) },
            pipeline: vec![Stage::Match(doc! {
                "$expr": { "$eq": [format!("${}", foreign_field), "$$key"] }
            })],
            as_field: as_field.to_string(),
        }
    }

    /// Join the document of `from` whose `_id` is stored in `local_field`.
    pub fn by_id(from: &str, local_field: &str, as_field: &str) -> Self {
        Self::correlated(from, local_field, "_id", as_field)
    }

    /// Append a stage to the sub-pipeline, after the correlation match.
    pub fn then(mut self, stage: Stage) -> Self {
        self.pipeline.push(stage);
        self
    }

    pub fn then_all(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.pipeline.extend(stages);
        self
    }

    fn into_document(self) -> Document {
        doc! {
            "from": self.from,
            "let": self.vars,
            "pipeline": render(self.pipeline),
            "as": self.as_field,
        }
    }
}

impl Unwind {
    /// Unwind that keeps the parent when the array is missing or empty.
    pub fn preserving(path: &str) -> Self {
        Self {
            path: path.to_string(),
            preserve_null_and_empty_arrays: true,
            include_array_index: None,
        }
    }

    pub fn with_index(mut self, field: &str) -> Self {
        self.include_array_index = Some(field.to_string());
        self
    }

    fn into_document(self) -> Document {
        let mut unwind = doc! {
            "path": format!("${}", self.path),
            "preserveNullAndEmptyArrays": self.preserve_null_and_empty_arrays,
        };
        if let Some(index) = self.include_array_index {
            unwind.insert("includeArrayIndex", index);
        }
        unwind
    }
}

impl Stage {
    /// Left outer join of a single related document.
    ///
    /// The parent is always kept; a missing relation ends up as `null`.
    pub fn join_one(lookup: Lookup) -> Vec<Stage> {
        let field = lookup.as_field.clone();
        let mut fallback = Document::new();
        fallback.insert(
            field.clone(),
            doc! { "$ifNull": [format!("${}", field), Bson::Null] },
        );

        vec![
            Stage::Lookup(lookup),
            Stage::Unwind(Unwind::preserving(&field)),
            Stage::AddFields(fallback),
        ]
    }

    pub fn into_document(self) -> Document {
        match self {
            Stage::Match(filter) => doc! { "$match": filter },
            Stage::Lookup(lookup) => doc! { "$lookup": lookup.into_document() },
            Stage::Unwind(unwind) => doc! { "$unwind": unwind.into_document() },
            Stage::AddFields(fields) => doc! { "$addFields": fields },
            Stage::Group(group) => doc! { "$group": group },
            Stage::Facet(branches) => {
                let mut facet = Document::new();
                for (name, stages) in branches {
                    facet.insert(name, render(stages));
                }
                doc! { "$facet": facet }
            }
            Stage::Sort(keys) => doc! { "$sort": keys },
            Stage::Skip(n) => doc! { "$skip": to_i64(n) },
            Stage::Limit(n) => doc! { "$limit": to_i64(n) },
            Stage::Count(field) => doc! { "$count": field },
        }
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn render(stages: Vec<Stage>) -> Vec<Document> {
    stages.into_iter().map(Stage::into_document).collect()
}

/// Ordered sequence of stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages_from(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages.extend(stages);
        self
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn into_documents(self) -> Vec<Document> {
        render(self.stages)
    }
}

impl FromIterator<Stage> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Pipeline {
    type Item = Stage;
    type IntoIter = std::vec::IntoIter<Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_id_lookup_renders_a_correlated_sub_pipeline() {
        let stage = Stage::Lookup(Lookup::by_id("media", "image", "image"));

        assert_eq!(
            stage.into_document(),
            doc! {
                "$lookup": {
                    "from": "media",
                    "let": { "key": "$image" },
                    "pipeline": [
                        { "$match": { "$expr": { "$eq": ["$_id", "$$key"] } } }
                    ],
                    "as": "image",
                }
            }
        );
    }

    #[test]
    fn join_one_keeps_the_parent_and_nulls_missing_relations() {
        let stages = Stage::join_one(Lookup::by_id("courses", "course_id", "course"));
        let rendered: Vec<Document> = stages.into_iter().map(Stage::into_document).collect();

        assert_eq!(rendered.len(), 3);
        assert_eq!(
            rendered[1],
            doc! { "$unwind": { "path": "$course", "preserveNullAndEmptyArrays": true } }
        );
        assert_eq!(
            rendered[2],
            doc! { "$addFields": { "course": { "$ifNull": ["$course", Bson::Null] } } }
        );
    }

    #[test]
    fn unwind_with_index_records_the_position() {
        let stage = Stage::Unwind(Unwind::preserving("sections").with_index("section_index"));

        assert_eq!(
            stage.into_document(),
            doc! {
                "$unwind": {
                    "path": "$sections",
                    "preserveNullAndEmptyArrays": true,
                    "includeArrayIndex": "section_index",
                }
            }
        );
    }

    #[test]
    fn facet_renders_each_branch_in_order() {
        let stage = Stage::Facet(vec![
            (
                "docs".to_string(),
                vec![Stage::Sort(doc! { "order": 1 }), Stage::Skip(20), Stage::Limit(10)],
            ),
            ("total".to_string(), vec![Stage::Count("count".to_string())]),
        ]);

        assert_eq!(
            stage.into_document(),
            doc! {
                "$facet": {
                    "docs": [
                        { "$sort": { "order": 1 } },
                        { "$skip": 20_i64 },
                        { "$limit": 10_i64 },
                    ],
                    "total": [ { "$count": "count" } ],
                }
            }
        );
    }

    #[test]
    fn pipeline_preserves_stage_order() {
        let pipeline = Pipeline::new()
            .stage(Stage::Match(doc! { "status": "available" }))
            .stages_from(vec![Stage::Skip(0), Stage::Limit(1)]);

        assert_eq!(pipeline.len(), 3);
        let docs = pipeline.into_documents();
        assert!(docs[0].contains_key("$match"));
        assert!(docs[1].contains_key("$skip"));
        assert!(docs[2].contains_key("$limit"));
    }

    #[test]
    fn huge_skip_saturates() {
        assert_eq!(
            Stage::Skip(u64::MAX).into_document(),
            doc! { "$skip": i64::MAX }
        );
    }
}
