//! Feed repository

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

use super::lookups::{self, FEEDS};
use crate::models::Feed;

#[derive(Clone)]
pub struct FeedRepository {
    store: Store<Feed>,
    assets: AssetUrl,
}

impl FeedRepository {
    pub fn new(db: &Database, assets: AssetUrl) -> Self {
        Self {
            store: Store::new(db, FEEDS),
            assets,
        }
    }

    pub async fn create(&self, mut feed: Feed) -> DatabaseResult<Feed> {
        feed.id = Some(self.store.insert(&feed).await?);
        info!("Created feed {:?} ({})", feed.id, feed.paralink);
        Ok(feed)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DatabaseResult<Feed> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("feed not found".to_string()))
    }

    pub fn list_pipeline(&self, query: &ListQuery) -> DatabaseResult<Pipeline> {
        let filter = Filter::new()
            .eq_opt("_id", query.id()?)
            .eq_opt("paralink", query.paralink())
            .search(query.search(), SearchFields::NAME_AND_TAGS);

        let pipeline = Pipeline::new()
            .stage(filter.into_stage())
            .stages_from(lookups::feed_sections(&self.assets));

        Ok(paginate(pipeline, sort_by("order", true), query))
    }

    pub async fn list(&self, query: &ListQuery) -> DatabaseResult<Page<Document>> {
        self.store.aggregate_page(self.list_pipeline(query)?).await
    }

    pub async fn update(&self, id: ObjectId, set: Document) -> DatabaseResult<Feed> {
        self.store
            .update_by_id(id, set)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("feed not found".to_string()))
    }

    pub async fn delete(&self, id: ObjectId) -> DatabaseResult<()> {
        if self.store.delete_by_id(id).await? {
            info!("Deleted feed {}", id);
            Ok(())
        } else {
            Err(DatabaseError::NotFound("feed not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_database;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn feeds_filter_by_paralink() {
        let repository =
            FeedRepository::new(&test_database().await, AssetUrl::new("http://localhost:8000"));
        let query = ListQuery {
            paralink: Some(" home ".to_string()),
            ..Default::default()
        };
        let docs = repository.list_pipeline(&query).unwrap().into_documents();
        assert_eq!(docs[0], doc! { "$match": { "paralink": "home" } });
        assert!(docs.last().unwrap().contains_key("$facet"));
    }
}
