//! Image upload handler.

use crate::{errors::AppError, models::image::Image, state::AppState};
use axum::{
    Json,
    extract::{Multipart, State},
};
use futures::TryStreamExt;
use std::io;

/// Multipart field carrying the upload.
const IMAGE_FIELD: &str = "image";

/// `POST /images`: store the first `image` field in the temporary area.
///
/// The response never includes the on-disk path.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Image>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let mime = field.content_type().map(str::to_string);
        let stream = field.map_err(io::Error::other);

        let image = state.images.store_upload(file_name, mime, stream).await?;
        tracing::info!("uploaded image {} ({} bytes)", image.id, image.size);
        return Ok(Json(image));
    }

    Err(AppError::bad_request("No image"))
}
