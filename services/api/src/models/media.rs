//! Media records for uploaded images

use common::assets::AssetUrl;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Media entity as stored in the `media` collection
///
/// `path` is relative to the asset base URL, for example `/assets/cover-1700000000000.png`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub path: String,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    pub created_on: i64,
    pub updated_on: i64,
}

/// Outward view of a media record with its fetchable URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub path: String,
    pub url: String,
    pub created_by: Option<String>,
    pub created_on: i64,
    pub updated_on: i64,
}

impl MediaResponse {
    pub fn new(media: Media, assets: &AssetUrl) -> Self {
        Self {
            id: media.id.map(|id| id.to_hex()).unwrap_or_default(),
            url: assets.resolve(&media.path),
            path: media.path,
            created_by: media.created_by.map(|id| id.to_hex()),
            created_on: media.created_on,
            updated_on: media.updated_on,
        }
    }
}
