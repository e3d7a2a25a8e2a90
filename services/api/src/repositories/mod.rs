//! Catalog repositories
//!
//! Each repository owns one collection. Reads of single records return the
//! stored document; list reads run an aggregation that joins related
//! records and ends in the `docs`/`total` facet.

pub mod books;
pub mod cart_items;
pub mod courses;
pub mod feeds;
pub mod lookups;
pub mod media;
pub mod stocks;

pub use books::BookRepository;
pub use cart_items::CartItemRepository;
pub use courses::CourseRepository;
pub use feeds::FeedRepository;
pub use media::MediaRepository;
pub use stocks::StockRepository;

#[cfg(test)]
pub(crate) async fn test_database() -> mongodb::Database {
    // Client construction does not connect; nothing here reaches a server.
    mongodb::Client::with_uri_str("mongodb://localhost:27017")
        .await
        .unwrap()
        .database("booksland_test")
}

#[cfg(test)]
pub(crate) fn stage_names(pipeline: common::pipeline::Pipeline) -> Vec<String> {
    pipeline
        .into_documents()
        .into_iter()
        .filter_map(|stage| stage.keys().next().cloned())
        .collect()
}
