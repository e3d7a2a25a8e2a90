//! Cart item repository
//!
//! Every operation takes an optional owner. When set, only items of that
//! user are visible, so a reader can never touch another reader's cart.

use common::{
    DatabaseError, DatabaseResult,
    assets::AssetUrl,
    pipeline::Pipeline,
    query::{Filter, ListQuery, Page, SearchFields, paginate, sort_by},
    store::Store,
};
use mongodb::{
    Database,
    bson::{Document, doc, oid::ObjectId},
};
use tracing::info;

use super::lookups::{self, CART_ITEMS};
use crate::models::CartItem;

#[derive(Clone)]
pub struct CartItemRepository {
    store: Store<CartItem>,
    assets: AssetUrl,
}

fn scoped(id: ObjectId, owner: Option<ObjectId>) -> Document {
    let mut filter = doc! { "_id": id };
    if let Some(owner) = owner {
        filter.insert("user_id", owner);
    }
    filter
}

fn not_found() -> DatabaseError {
    DatabaseError::NotFound("cart item not found".to_string())
}

impl CartItemRepository {
    pub fn new(db: &Database, assets: AssetUrl) -> Self {
        Self {
            store: Store::new(db, CART_ITEMS),
            assets,
        }
    }

    pub async fn create(&self, mut item: CartItem) -> DatabaseResult<CartItem> {
        item.id = Some(self.store.insert(&item).await?);
        info!("Added book {} to cart of {}", item.book_id, item.user_id);
        Ok(item)
    }

    pub async fn find_by_id(&self, id: ObjectId, owner: Option<ObjectId>) -> DatabaseResult<CartItem> {
        self.store
            .find_one(scoped(id, owner))
            .await?
            .ok_or_else(not_found)
    }

    pub fn list_pipeline(
        &self,
        query: &ListQuery,
        owner: Option<ObjectId>,
    ) -> DatabaseResult<Pipeline> {
        let filter = Filter::new()
            .eq_opt("_id", query.id()?)
            .eq_opt("user_id", owner)
            .eq_opt("book_id", query.book_id()?)
            .eq_opt("course_id", query.course_id()?)
            .search(query.search(), SearchFields::PUBLISHER);

        let pipeline = Pipeline::new()
            .stage(filter.into_stage())
            .stages_from(lookups::book(&self.assets, "book_id", "book"))
            .stages_from(lookups::course(&self.assets, "course_id", "course"));

        Ok(paginate(pipeline, sort_by("_id", true), query))
    }

    pub async fn list(
        &self,
        query: &ListQuery,
        owner: Option<ObjectId>,
    ) -> DatabaseResult<Page<Document>> {
        self.store
            .aggregate_page(self.list_pipeline(query, owner)?)
            .await
    }

    pub async fn update(
        &self,
        id: ObjectId,
        owner: Option<ObjectId>,
        set: Document,
    ) -> DatabaseResult<CartItem> {
        self.store
            .update_one(scoped(id, owner), set)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, id: ObjectId, owner: Option<ObjectId>) -> DatabaseResult<()> {
        if self.store.delete_one(scoped(id, owner)).await? {
            Ok(())
        } else {
            Err(not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_database;

    #[test]
    fn owner_scoping_narrows_the_filter() {
        let id = ObjectId::new();
        let owner = ObjectId::new();
        assert_eq!(scoped(id, None), doc! { "_id": id });
        assert_eq!(scoped(id, Some(owner)), doc! { "_id": id, "user_id": owner });
    }

    #[tokio::test]
    async fn readers_only_list_their_own_items() {
        let repository =
            CartItemRepository::new(&test_database().await, AssetUrl::new("http://localhost:8000"));
        let owner = ObjectId::new();

        let docs = repository
            .list_pipeline(&ListQuery::default(), Some(owner))
            .unwrap()
            .into_documents();
        assert_eq!(docs[0], doc! { "$match": { "user_id": owner } });
    }
}
