//! Stock repository

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

use super::lookups::{self, STOCKS};
use crate::models::Stock;

#[derive(Clone)]
pub struct StockRepository {
    store: Store<Stock>,
    assets: AssetUrl,
}

impl StockRepository {
    pub fn new(db: &Database, assets: AssetUrl) -> Self {
        Self {
            store: Store::new(db, STOCKS),
            assets,
        }
    }

    pub async fn create(&self, mut stock: Stock) -> DatabaseResult<Stock> {
        stock.id = Some(self.store.insert(&stock).await?);
        info!("Created stock {:?} for book {}", stock.id, stock.book_id);
        Ok(stock)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DatabaseResult<Stock> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("stock not found".to_string()))
    }

    pub fn list_pipeline(&self, query: &ListQuery) -> DatabaseResult<Pipeline> {
        let filter = Filter::new()
            .eq_opt("_id", query.id()?)
            .eq_opt("book_id", query.book_id()?)
            .eq_opt("course_id", query.course_id()?)
            .search(query.search(), SearchFields::PUBLISHER);

        let pipeline = Pipeline::new()
            .stage(filter.into_stage())
            .stages_from(lookups::book(&self.assets, "book_id", "book"))
            .stages_from(lookups::course(&self.assets, "course_id", "course"));

        Ok(paginate(pipeline, sort_by("_id", true), query))
    }

    pub async fn list(&self, query: &ListQuery) -> DatabaseResult<Page<Document>> {
        self.store.aggregate_page(self.list_pipeline(query)?).await
    }

    pub async fn update(&self, id: ObjectId, set: Document) -> DatabaseResult<Stock> {
        self.store
            .update_by_id(id, set)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("stock not found".to_string()))
    }

    pub async fn delete(&self, id: ObjectId) -> DatabaseResult<()> {
        if self.store.delete_by_id(id).await? {
            info!("Deleted stock {}", id);
            Ok(())
        } else {
            Err(DatabaseError::NotFound("stock not found".to_string()))
        }
    }
}
