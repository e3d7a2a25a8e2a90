//! Integration tests for the document store plumbing
//!
//! These tests need a reachable MongoDB (`MONGO_URI`, default
//! `mongodb://localhost:27017`) and are ignored by default.

use common::{
    database::{DatabaseConfig, health_check, init_database},
    pipeline::Pipeline,
    query::{Filter, ListQuery, SearchFields, paginate, sort_by},
    store::Store,
};
use mongodb::bson::{Document, doc, oid::ObjectId};

async fn scratch_store() -> Result<Store<Document>, Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    let db = init_database(&config).await?;
    assert!(health_check(&db).await?, "Database health check failed");

    let name = format!("it_books_{}", ObjectId::new().to_hex());
    Ok(Store::new(&db, &name))
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_paginated_search_counts_before_paging() -> Result<(), Box<dyn std::error::Error>> {
    let store = scratch_store().await?;

    for (i, name) in ["Algebra I", "Linear ALGEBRA", "Geometry", "Calculus"]
        .iter()
        .enumerate()
    {
        let tags = if *name == "Calculus" { vec!["algebra-adjacent"] } else { vec![] };
        store
            .insert(&doc! { "name": *name, "tags": tags, "order": i as i32 })
            .await?;
    }

    let query = ListQuery {
        search: Some("algebra".to_string()),
        limit: Some(2),
        ..Default::default()
    };
    let filter = Filter::new().search(query.search(), SearchFields::NAME_AND_TAGS);
    let pipeline = paginate(
        Pipeline::new().stage(filter.into_stage()),
        sort_by("order", true),
        &query,
    );

    let page = store.aggregate_page(pipeline).await?;
    assert_eq!(page.total.count, 3);
    assert_eq!(page.docs.len(), 2);
    assert_eq!(page.docs[0].get_str("name")?, "Algebra I");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_empty_result_still_reports_a_total() -> Result<(), Box<dyn std::error::Error>> {
    let store = scratch_store().await?;

    let query = ListQuery::default();
    let pipeline = paginate(
        Pipeline::new().stage(Filter::new().eq("name", "missing").into_stage()),
        sort_by("_id", true),
        &query,
    );

    let page = store.aggregate_page(pipeline).await?;
    assert!(page.docs.is_empty());
    assert_eq!(page.total.count, 0);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_update_rejects_empty_set() -> Result<(), Box<dyn std::error::Error>> {
    let store = scratch_store().await?;
    let id = store.insert(&doc! { "name": "Algebra" }).await?;

    let err = store.update_by_id(id, Document::new()).await.unwrap_err();
    assert!(err.is_client_error());

    let updated = store.update_by_id(id, doc! { "name": "Algebra II" }).await?;
    let updated = updated.expect("document exists");
    assert_eq!(updated.get_str("name")?, "Algebra II");
    assert!(updated.get_i64("updated_on").is_ok());

    Ok(())
}
