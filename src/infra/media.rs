//! Uploaded image files under the media root.
//!
//! Files are written as `<root>/<dir>/<uuid>.<ext>` and referenced by their
//! public URL `<url_prefix><dir>/<uuid>.<ext>`. Serving them is left to the
//! reverse proxy.

use crate::domain::DecodedImage;
use crate::error::AppError;
use std::path::PathBuf;
use uuid::Uuid;

pub const RECIPE_IMAGES_DIR: &str = "recipes/images";
pub const AVATARS_DIR: &str = "users/avatars";

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let mut url_prefix = url_prefix.trim().to_string();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Write the image and return its public URL.
    pub fn save(&self, dir: &str, image: &DecodedImage) -> Result<String, AppError> {
        let name = format!("{}.{}", Uuid::new_v4().simple(), image.format.extension());
        let target_dir = self.root.join(dir);
        std::fs::create_dir_all(&target_dir)?;
        std::fs::write(target_dir.join(&name), &image.bytes)?;
        log::debug!("stored {} bytes as {}/{}", image.bytes.len(), dir, name);
        Ok(format!("{}{}/{}", self.url_prefix, dir, name))
    }

    /// Delete the file behind a URL produced by [`MediaStore::save`].
    /// URLs outside this store are ignored.
    pub fn remove(&self, url: &str) {
        let Some(relative) = url.strip_prefix(&self.url_prefix) else {
            return;
        };
        if relative.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return;
        }
        let path = self.root.join(relative);
        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("failed to remove media file {:?}: {}", path, e);
        }
    }

    pub fn path_for(&self, url: &str) -> Option<PathBuf> {
        url.strip_prefix(&self.url_prefix)
            .map(|relative| self.root.join(relative))
    }
}
