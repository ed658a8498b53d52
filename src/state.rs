//! Shared handler state, built once from an injected SQLite pool.

use crate::services::{
    client_store::ClientStore, image_resolver::ImageResolver, image_store::ImageStore,
};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};

/// Everything a handler needs. Cloned per request; the pool is shared.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub public_dir: PathBuf,
    pub clients: ClientStore,
    pub images: ImageStore,
    pub resolver: ImageResolver,
}

impl AppState {
    /// Uploads go to `public_dir/tmp`, published client images to
    /// `public_dir/img/clients`.
    pub fn new(db: Arc<SqlitePool>, public_dir: impl Into<PathBuf>) -> Self {
        let public_dir = public_dir.into();
        let images = ImageStore::new(db.clone(), public_dir.join("tmp"));
        Self {
            clients: ClientStore::new(db.clone()),
            resolver: ImageResolver::new(images.clone(), public_dir.clone()),
            images,
            public_dir,
            db,
        }
    }
}
