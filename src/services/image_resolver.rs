//! Publishes a temporary upload so a client can reference it.

use super::{StoreError, image_store::ImageStore};
use crate::models::client::ImageRef;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Public path prefix of published client images.
pub const CLIENT_IMAGE_SRC_PREFIX: &str = "/img/clients";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("image `{0}` not found")]
    ImageNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("copying {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

#[derive(Clone)]
pub struct ImageResolver {
    images: ImageStore,
    public_dir: PathBuf,
}

impl ImageResolver {
    pub fn new(images: ImageStore, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            images,
            public_dir: public_dir.into(),
        }
    }

    /// Directory published client images are copied into.
    pub fn image_dir(&self) -> PathBuf {
        self.public_dir.join("img").join("clients")
    }

    /// Copy the upload into the public image directory under its base name
    /// and return the reference to embed.
    ///
    /// The temporary file and the image row are left untouched. A copy that
    /// is never followed by a save stays behind as an orphan.
    pub async fn resolve(&self, image_id: &str) -> Result<ImageRef, ResolveError> {
        let image = self
            .images
            .get(image_id)
            .await?
            .ok_or_else(|| ResolveError::ImageNotFound(image_id.to_string()))?;

        let from = PathBuf::from(&image.path);
        let dir = self.image_dir();
        let file_name = Path::new(&image.path)
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| ResolveError::Copy {
                from: from.clone(),
                to: dir.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "image path has no file name"),
            })?;
        let to = dir.join(&file_name);

        let copied = async {
            fs::create_dir_all(&dir).await?;
            fs::copy(&from, &to).await
        }
        .await;
        if let Err(source) = copied {
            return Err(ResolveError::Copy { from, to, source });
        }
        debug!("published image {} at {}", image_id, to.display());

        Ok(ImageRef {
            src: format!("{}/{}", CLIENT_IMAGE_SRC_PREFIX, file_name),
            mime: image.mime,
            size: image.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use bytes::Bytes;
    use futures::stream;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup(dir: &TempDir) -> (ImageStore, ImageResolver) {
        let images = ImageStore::new(Arc::new(db::memory().await), dir.path().join("tmp"));
        let resolver = ImageResolver::new(images.clone(), dir.path());
        (images, resolver)
    }

    #[tokio::test]
    async fn unknown_image_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (_, resolver) = setup(&dir).await;
        let err = resolver.resolve("nope").await.unwrap_err();
        assert!(matches!(err, ResolveError::ImageNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn known_image_is_copied_and_referenced_by_base_name() {
        let dir = TempDir::new().unwrap();
        let (images, resolver) = setup(&dir).await;
        let image = images
            .store_upload(
                Some("face.jpg".into()),
                Some("image/jpeg".into()),
                stream::iter(vec![Ok(Bytes::from_static(b"jpegdata"))]),
            )
            .await
            .unwrap();

        let reference = resolver.resolve(&image.id).await.unwrap();
        let base = format!("{}.jpg", image.id);
        assert_eq!(reference.src, format!("/img/clients/{}", base));
        assert!(!reference.src.contains(dir.path().to_str().unwrap()));
        assert_eq!(reference.mime.as_deref(), Some("image/jpeg"));
        assert_eq!(reference.size, 8);

        let published = dir.path().join("img").join("clients").join(&base);
        assert_eq!(std::fs::read(published).unwrap(), b"jpegdata");
        // the temporary upload and its row stay
        assert!(Path::new(&image.path).exists());
        assert!(images.get(&image.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_temp_file_is_a_copy_error() {
        let dir = TempDir::new().unwrap();
        let (images, resolver) = setup(&dir).await;
        let image = images
            .store_upload(None, None, stream::iter(vec![Ok(Bytes::from_static(b"x"))]))
            .await
            .unwrap();
        std::fs::remove_file(&image.path).unwrap();

        let err = resolver.resolve(&image.id).await.unwrap_err();
        assert!(matches!(err, ResolveError::Copy { .. }));
    }
}
