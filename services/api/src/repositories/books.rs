//! Book repository

use common::{
    DatabaseError, DatabaseResult,
    assets::AssetUrl,
    pipeline::Pipeline,
    query::{Filter, ListQuery, Page, SearchFields, paginate, sort_by},
    store::Store,
};
use mongodb::{
    Database,
    bson::{Document, oid::ObjectId},
};
use tracing::info;

use super::lookups::{self, BOOKS};
use crate::models::Book;

#[derive(Clone)]
pub struct BookRepository {
    store: Store<Book>,
    assets: AssetUrl,
}

impl BookRepository {
    pub fn new(db: &Database, assets: AssetUrl) -> Self {
        Self {
            store: Store::new(db, BOOKS),
            assets,
        }
    }

    pub async fn create(&self, mut book: Book) -> DatabaseResult<Book> {
        book.id = Some(self.store.insert(&book).await?);
        info!("Created book {:?}", book.id);
        Ok(book)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DatabaseResult<Book> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("book not found".to_string()))
    }

    /// Filter, join image, course and stock summary, then paginate by `order`
    pub fn list_pipeline(&self, query: &ListQuery) -> DatabaseResult<Pipeline> {
        let filter = Filter::new()
            .eq_opt("_id", query.id()?)
            .eq_opt("course_id", query.course_id()?)
            .search(query.search(), SearchFields::NAME_AND_TAGS);

        let pipeline = Pipeline::new()
            .stage(filter.into_stage())
            .stages_from(lookups::image(&self.assets, "image", "image"))
            .stages_from(lookups::course(&self.assets, "course_id", "course"))
            .stage(lookups::stock_summary("book_id"));

        Ok(paginate(pipeline, sort_by("order", true), query))
    }

    pub async fn list(&self, query: &ListQuery) -> DatabaseResult<Page<Document>> {
        self.store.aggregate_page(self.list_pipeline(query)?).await
    }

    pub async fn update(&self, id: ObjectId, set: Document) -> DatabaseResult<Book> {
        self.store
            .update_by_id(id, set)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("book not found".to_string()))
    }

    pub async fn delete(&self, id: ObjectId) -> DatabaseResult<()> {
        if self.store.delete_by_id(id).await? {
            info!("Deleted book {}", id);
            Ok(())
        } else {
            Err(DatabaseError::NotFound("book not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{stage_names, test_database};
    use mongodb::bson::doc;

    async fn repository() -> BookRepository {
        BookRepository::new(&test_database().await, AssetUrl::new("http://localhost:8000"))
    }

    #[tokio::test]
    async fn list_pipeline_filters_then_enriches_then_paginates() {
        let course = ObjectId::new();
        let query = ListQuery {
            course_id: Some(course.to_hex()),
            search: Some("algebra".to_string()),
            ..Default::default()
        };
        let pipeline = repository().await.list_pipeline(&query).unwrap();

        let first = pipeline.stages()[0].clone().into_document();
        let filter = first.get_document("$match").unwrap();
        assert_eq!(filter.get_object_id("course_id").unwrap(), course);
        assert!(filter.contains_key("$or"));

        let names = stage_names(pipeline);
        assert_eq!(names.first().map(String::as_str), Some("$match"));
        assert_eq!(names.last().map(String::as_str), Some("$facet"));
        assert_eq!(names.iter().filter(|n| *n == "$lookup").count(), 3);
    }

    #[tokio::test]
    async fn malformed_filter_ids_fail_before_querying() {
        let query = ListQuery {
            course_id: Some("not-an-id".to_string()),
            ..Default::default()
        };
        let err = repository().await.list_pipeline(&query).unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn docs_branch_sorts_by_order() {
        let pipeline = repository()
            .await
            .list_pipeline(&ListQuery::default())
            .unwrap();
        let facet = pipeline.into_documents().pop().unwrap();
        let docs = facet
            .get_document("$facet")
            .unwrap()
            .get_array("docs")
            .unwrap();
        assert_eq!(
            docs[0].as_document().unwrap(),
            &doc! { "$sort": { "order": 1, "_id": 1 } }
        );
    }
}
