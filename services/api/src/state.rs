//! Application state shared across handlers

use auth::{SessionManager, repositories::UserRepository};
use common::assets::AssetUrl;
use mongodb::Database;

use crate::{
    repositories::{
        BookRepository, CartItemRepository, CourseRepository, FeedRepository, MediaRepository,
        StockRepository,
    },
    upload::MediaStorage,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionManager,
    pub books: BookRepository,
    pub courses: CourseRepository,
    pub stocks: StockRepository,
    pub cart_items: CartItemRepository,
    pub media: MediaRepository,
    pub feeds: FeedRepository,
    pub storage: MediaStorage,
}

impl AppState {
    pub fn new(
        db: Database,
        sessions: SessionManager,
        assets: AssetUrl,
        storage: MediaStorage,
    ) -> Self {
        Self {
            books: BookRepository::new(&db, assets.clone()),
            courses: CourseRepository::new(&db, assets.clone()),
            stocks: StockRepository::new(&db, assets.clone()),
            cart_items: CartItemRepository::new(&db, assets.clone()),
            media: MediaRepository::new(&db, assets.clone()),
            feeds: FeedRepository::new(&db, assets),
            storage,
            sessions,
            db,
        }
    }

    pub fn users(&self) -> &UserRepository {
        self.sessions.users()
    }
}
