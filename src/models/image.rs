//! Represents an uploaded image waiting in the temporary area.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// An uploaded image.
///
/// The on-disk `path` stays internal; clients only ever see `src`.
#[derive(Serialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,

    /// Location of the uploaded file on disk.
    #[serde(skip_serializing)]
    pub path: String,

    /// Public path of the temporary copy.
    pub src: String,

    /// Original filename as sent by the uploader.
    pub name: Option<String>,

    pub mime: Option<String>,

    /// Size in bytes.
    pub size: i64,

    pub created_at: DateTime<Utc>,
}
