//! Database access façade
//!
//! The sole permitted entry point from UI-side code into the backend-owned
//! image/tag database. Each method maps 1:1 to a named backend operation and
//! fixes the request/response types; nothing here caches or post-processes:
//! results flow through unchanged, and errors are never swallowed.
//!
//! The one composite operation is [`DatabaseService::resolve_image`]: the
//! add-then-fallback-lookup sequence the tag dialogs use to obtain a stable
//! integer id before any tag operation is issued.

use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;

use crate::rpc::{Backend, RpcError};
use crate::schema::{ImageRecord, Tag};

/// Typed client over the backend's image/tag operations
#[derive(Clone)]
pub struct DatabaseService {
    backend: Arc<dyn Backend>,
}

impl DatabaseService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Register an image and return its id (upsert on the backend side)
    ///
    /// # Errors
    /// Returns `RpcError` when backend storage is unavailable.
    pub async fn add_image(&self, filepath: &Path, category: &str) -> Result<i64, RpcError> {
        self.backend.add_image(filepath, category).await
    }

    /// Look up the id of an already registered image
    ///
    /// A missing registration is the expected fallback condition, so it maps
    /// to `Ok(None)` rather than an error; only transport and backend
    /// failures propagate as `Err`.
    ///
    /// # Errors
    /// Returns `RpcError` for transport or backend failures.
    pub async fn image_id(
        &self,
        filepath: &Path,
        category: &str,
    ) -> Result<Option<i64>, RpcError> {
        match self.backend.get_image_id(filepath, category).await {
            Ok(id) => Ok(Some(id)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve the stable id for a `(filepath, category)` pair
    ///
    /// Tries `add_image` first; if that fails for any reason, falls back to
    /// the lookup. The image is unresolvable only when the fallback also
    /// comes up empty.
    ///
    /// # Errors
    /// Returns the original `add_image` error when the fallback lookup finds
    /// nothing, or the lookup's own transport error.
    pub async fn resolve_image(&self, filepath: &Path, category: &str) -> Result<i64, RpcError> {
        let add_err = match self.backend.add_image(filepath, category).await {
            Ok(id) => return Ok(id),
            Err(e) => e,
        };
        debug!(
            "add_image failed for {} ({category}), falling back to lookup: {add_err}",
            filepath.display()
        );

        match self.image_id(filepath, category).await? {
            Some(id) => Ok(id),
            None => {
                warn!(
                    "image {} ({category}) could not be resolved",
                    filepath.display()
                );
                Err(add_err)
            }
        }
    }

    /// Create a tag by name, idempotently, and return its id
    ///
    /// # Errors
    /// Returns `RpcError` for transport or backend failures.
    pub async fn add_tag(&self, name: &str) -> Result<i64, RpcError> {
        self.backend.add_tag(name).await
    }

    /// Attach a tag to a resolved image
    ///
    /// # Errors
    /// Returns `RpcError::NotFound` when the image id is unknown.
    pub async fn tag_image(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        self.backend.tag_image(image_id, tag_name).await
    }

    /// Tag names attached to an image (empty is a valid answer)
    ///
    /// # Errors
    /// Returns `RpcError` for transport or backend failures.
    pub async fn image_tags(&self, image_id: i64) -> Result<Vec<String>, RpcError> {
        self.backend.get_image_tags(image_id).await
    }

    /// Images carrying all of the given tags (empty is a valid answer)
    ///
    /// # Errors
    /// Returns `RpcError` for transport or backend failures.
    pub async fn search_by_tags(&self, tags: &[String]) -> Result<Vec<ImageRecord>, RpcError> {
        self.backend.search_images_by_tags(tags).await
    }

    /// Detach a tag from an image; a no-op when not associated
    ///
    /// # Errors
    /// Returns `RpcError` for transport or backend failures.
    pub async fn remove_image_tag(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        self.backend.remove_image_tag(image_id, tag_name).await
    }

    /// All tag records, category-flagged and plain alike
    ///
    /// # Errors
    /// Returns `RpcError` for transport or backend failures.
    pub async fn all_tags(&self) -> Result<Vec<Tag>, RpcError> {
        self.backend.get_all_tags().await
    }
}
