//! Media routes
//!
//! Uploads are written to disk, then recorded. Deletion removes the file
//! before the record; when the file cannot be removed the record is kept.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    routing::get,
};
use axum_extra::extract::WithRejection;
use common::{database::now_millis, query::Page};
use serde_json::Value;
use tracing::{error, info};

use super::{IdPath, ListParams, object_id};
use crate::{
    error::{ApiError, ApiResult},
    middleware::{Admin, Anyone, Authorized},
    models::{Media, MediaResponse},
    response::ApiResponse,
    state::AppState,
};

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/media", get(list).post(upload))
        .route("/media/:id", get(fetch).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Query(query), _): ListParams,
) -> ApiResult<ApiResponse<Page<Value>>> {
    let page = state.media.list(&query).await?;
    Ok(ApiResponse::ok(page.into_json()))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<MediaResponse>> {
    let media = state.media.find_by_id(object_id(&id)?).await?;
    Ok(ApiResponse::ok(MediaResponse::new(media, state.media.assets())))
}

async fn upload(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<MediaResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        let stored = state.storage.save(file_name.as_deref(), &bytes).await?;

        let now = now_millis();
        let record = Media {
            id: None,
            path: stored.path.clone(),
            created_by: auth.user_id(),
            created_on: now,
            updated_on: now,
        };

        let media = match state.media.create(record).await {
            Ok(media) => media,
            Err(e) => {
                if let Err(cleanup) = state.storage.remove(&stored.path).await {
                    error!("Orphaned upload {}: {}", stored.file_name, cleanup);
                }
                return Err(e.into());
            }
        };

        info!("Uploaded {} as media {:?}", stored.file_name, media.id);
        return Ok(ApiResponse::ok(MediaResponse::new(
            media,
            state.media.assets(),
        )));
    }

    Err(ApiError::BadRequest(format!(
        "multipart field '{}' is required",
        FILE_FIELD
    )))
}

/// Remove the stored file, then the record
async fn remove(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<&'static str>> {
    let id = object_id(&id)?;
    let media = state.media.find_by_id(id).await?;

    state.storage.remove(&media.path).await?;
    state.media.delete(id).await?;
    Ok(ApiResponse::ok("Media deleted"))
}
