//! Typed collection handle with the CRUD operations every entity shares

use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc, oid::ObjectId},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    database::{Operation, bounded, now_millis},
    error::{DatabaseError, DatabaseResult},
    pipeline::Pipeline,
    query::Page,
};

/// A collection of `T` documents
pub struct Store<T> {
    collection: Collection<T>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}

impl<T> Store<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(db: &Database, name: &str) -> Self {
        Self {
            collection: db.collection::<T>(name),
        }
    }

    pub fn name(&self) -> &str {
        self.collection.name()
    }

    pub async fn insert(&self, value: &T) -> DatabaseResult<ObjectId> {
        let result = bounded(
            Operation::Create,
            "insert",
            self.collection.insert_one(value, None),
        )
        .await?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            DatabaseError::Validation(format!("{} insert returned a non object id", self.name()))
        })
    }

    pub async fn find_one(&self, filter: Document) -> DatabaseResult<Option<T>> {
        bounded(
            Operation::Read,
            "find one",
            self.collection.find_one(filter, None),
        )
        .await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DatabaseResult<Option<T>> {
        self.find_one(doc! { "_id": id }).await
    }

    /// Plain `find` with paging, for collections that need no enrichment
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Document,
        skip: u64,
        limit: u64,
    ) -> DatabaseResult<Vec<T>> {
        let options = FindOptions::builder()
            .sort(sort)
            .skip(skip)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        bounded(Operation::Read, "find", async {
            let cursor = self.collection.find(filter, options).await?;
            cursor.try_collect().await
        })
        .await
    }

    pub async fn count(&self, filter: Document) -> DatabaseResult<u64> {
        bounded(
            Operation::Read,
            "count",
            self.collection.count_documents(filter, None),
        )
        .await
    }

    /// Atomically `$set` the given fields and return the updated document.
    ///
    /// `updated_on` is always refreshed. An empty `set` is rejected.
    pub async fn update_one(&self, filter: Document, set: Document) -> DatabaseResult<Option<T>> {
        if set.is_empty() {
            return Err(DatabaseError::Validation(
                "No fields to update".to_string(),
            ));
        }

        let mut set = set;
        set.insert("updated_on", now_millis());

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        bounded(
            Operation::Update,
            "update",
            self.collection
                .find_one_and_update(filter, doc! { "$set": set }, options),
        )
        .await
    }

    pub async fn update_by_id(&self, id: ObjectId, set: Document) -> DatabaseResult<Option<T>> {
        self.update_one(doc! { "_id": id }, set).await
    }

    /// Delete matching document, returning whether one existed
    pub async fn delete_one(&self, filter: Document) -> DatabaseResult<bool> {
        let result = bounded(
            Operation::Delete,
            "delete",
            self.collection.delete_one(filter, None),
        )
        .await?;

        Ok(result.deleted_count > 0)
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> DatabaseResult<bool> {
        self.delete_one(doc! { "_id": id }).await
    }

    pub async fn aggregate(&self, pipeline: Pipeline) -> DatabaseResult<Vec<Document>> {
        let stages = pipeline.into_documents();
        debug!(collection = self.name(), ?stages, "running aggregation");

        bounded(Operation::Read, "aggregate", async {
            let cursor = self.collection.aggregate(stages, None).await?;
            cursor.try_collect().await
        })
        .await
    }

    /// Run a pipeline that ends in the `docs`/`total` facet
    pub async fn aggregate_page(&self, pipeline: Pipeline) -> DatabaseResult<Page<Document>> {
        let output = self.aggregate(pipeline).await?;
        Page::from_facet(output.into_iter().next())
    }
}
