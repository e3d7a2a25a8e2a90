//! Course repository

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

use super::lookups::{self, COURSES};
use crate::models::Course;

#[derive(Clone)]
pub struct CourseRepository {
    store: Store<Course>,
    assets: AssetUrl,
}

impl CourseRepository {
    pub fn new(db: &Database, assets: AssetUrl) -> Self {
        Self {
            store: Store::new(db, COURSES),
            assets,
        }
    }

    pub async fn create(&self, mut course: Course) -> DatabaseResult<Course> {
        course.id = Some(self.store.insert(&course).await?);
        info!("Created course {:?}", course.id);
        Ok(course)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DatabaseResult<Course> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("course not found".to_string()))
    }

    pub fn list_pipeline(&self, query: &ListQuery) -> DatabaseResult<Pipeline> {
        let filter = Filter::new()
            .eq_opt("_id", query.id()?)
            .search(query.search(), SearchFields::NAME_AND_TAGS);

        let pipeline = Pipeline::new()
            .stage(filter.into_stage())
            .stages_from(lookups::image(&self.assets, "image", "image"));

        Ok(paginate(pipeline, sort_by("order", true), query))
    }

    pub async fn list(&self, query: &ListQuery) -> DatabaseResult<Page<Document>> {
        self.store.aggregate_page(self.list_pipeline(query)?).await
    }

    pub async fn update(&self, id: ObjectId, set: Document) -> DatabaseResult<Course> {
        self.store
            .update_by_id(id, set)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("course not found".to_string()))
    }

    pub async fn delete(&self, id: ObjectId) -> DatabaseResult<()> {
        if self.store.delete_by_id(id).await? {
            info!("Deleted course {}", id);
            Ok(())
        } else {
            Err(DatabaseError::NotFound("course not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{stage_names, test_database};

    #[tokio::test]
    async fn courses_join_only_their_image() {
        let repository =
            CourseRepository::new(&test_database().await, AssetUrl::new("http://localhost:8000"));
        let names = stage_names(repository.list_pipeline(&ListQuery::default()).unwrap());
        assert_eq!(
            names,
            vec!["$match", "$lookup", "$unwind", "$addFields", "$facet"]
        );
    }
}
