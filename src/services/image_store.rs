//! Temporary image uploads.
//!
//! Upload payloads are streamed to `upload_dir/{uuid}.{ext}` and described by
//! a row in the `images` table. Nothing here publishes an image; see
//! `ImageResolver` for that.

use super::{StoreError, StoreResult};
use crate::models::image::Image;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use sqlx::SqlitePool;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// Public path prefix of the upload area.
pub const UPLOAD_SRC_PREFIX: &str = "/tmp";

const IMAGE_COLUMNS: &str = "id, path, src, name, mime, size, created_at";

#[derive(Clone)]
pub struct ImageStore {
    db: Arc<SqlitePool>,
    upload_dir: PathBuf,
}

impl ImageStore {
    pub fn new(db: Arc<SqlitePool>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Stream an upload to disk and record it.
    ///
    /// The stored file gets a fresh name but keeps the original extension.
    /// The partial file is removed if the stream or the insert fails.
    pub async fn store_upload<S>(
        &self,
        file_name: Option<String>,
        mime: Option<String>,
        stream: S,
    ) -> StoreResult<Image>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        fs::create_dir_all(&self.upload_dir).await?;

        let id = Uuid::new_v4().to_string();
        let stored_name = match file_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.clone(),
        };
        let path = self.upload_dir.join(&stored_name);

        let size = match write_stream(&path, stream).await {
            Ok(size) => size,
            Err(err) => {
                let _ = fs::remove_file(&path).await;
                return Err(StoreError::Io(err));
            }
        };

        let insert_result = sqlx::query_as::<_, Image>(&format!(
            "INSERT INTO images (id, path, src, name, mime, size, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(&id)
        .bind(path.to_string_lossy().into_owned())
        .bind(format!("{}/{}", UPLOAD_SRC_PREFIX, stored_name))
        .bind(file_name)
        .bind(mime)
        .bind(size)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match insert_result {
            Ok(image) => {
                debug!("stored upload {} ({} bytes) at {}", id, size, path.display());
                Ok(image)
            }
            Err(err) => {
                let _ = fs::remove_file(&path).await;
                Err(StoreError::Sqlx(err))
            }
        }
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(image)
    }
}

/// Write every chunk to `path`, flush and fsync. Returns the byte count.
async fn write_stream<S>(path: &Path, stream: S) -> io::Result<i64>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let mut file = File::create(path).await?;
    let mut size: i64 = 0;
    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        size += chunk.len() as i64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(size)
}
