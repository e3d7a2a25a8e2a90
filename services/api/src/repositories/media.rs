//! Media repository

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

use super::lookups::{self, MEDIA};
use crate::models::Media;

#[derive(Clone)]
pub struct MediaRepository {
    store: Store<Media>,
    assets: AssetUrl,
}

impl MediaRepository {
    pub fn new(db: &Database, assets: AssetUrl) -> Self {
        Self {
            store: Store::new(db, MEDIA),
            assets,
        }
    }

    pub fn assets(&self) -> &AssetUrl {
        &self.assets
    }

    pub async fn create(&self, mut media: Media) -> DatabaseResult<Media> {
        media.id = Some(self.store.insert(&media).await?);
        info!("Recorded media {:?} at {}", media.id, media.path);
        Ok(media)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DatabaseResult<Media> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("media not found".to_string()))
    }

    /// Newest first, each with its `url`
    pub fn list_pipeline(&self, query: &ListQuery) -> DatabaseResult<Pipeline> {
        let filter = Filter::new()
            .eq_opt("_id", query.id()?)
            .search(query.search(), SearchFields::PATH);

        let pipeline = Pipeline::new()
            .stage(filter.into_stage())
            .stage(lookups::hydrate_url(&self.assets));

        Ok(paginate(pipeline, sort_by("_id", false), query))
    }

    pub async fn list(&self, query: &ListQuery) -> DatabaseResult<Page<Document>> {
        self.store.aggregate_page(self.list_pipeline(query)?).await
    }

    /// Remove the record only; the stored file is handled by the caller
    pub async fn delete(&self, id: ObjectId) -> DatabaseResult<()> {
        if self.store.delete_by_id(id).await? {
            info!("Deleted media record {}", id);
            Ok(())
        } else {
            Err(DatabaseError::NotFound("media not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_database;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn media_lists_newest_first_with_urls() {
        let assets = AssetUrl::new("http://localhost:8000");
        let repository = MediaRepository::new(&test_database().await, assets.clone());
        let docs = repository
            .list_pipeline(&ListQuery::default())
            .unwrap()
            .into_documents();

        assert_eq!(docs[1], doc! { "$addFields": { "url": assets.expression("path") } });
        let facet = docs[2].get_document("$facet").unwrap();
        assert_eq!(
            facet.get_array("docs").unwrap()[0].as_document().unwrap(),
            &doc! { "$sort": { "_id": -1 } }
        );
    }
}
