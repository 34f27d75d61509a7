//! Backend boundary for lockerz-core
//!
//! The application core (settings persistence, the SQLite tag database, the
//! image encoder) lives in a separate native process. This module models that
//! boundary as the [`Backend`] trait: one method per named backend operation,
//! each a plain request/response pair. The concrete transport (IPC pipe,
//! local call, HTTP) is an implementation detail behind the trait.
//!
//! Two rules hold for every method:
//! - the call either fully succeeds or returns an [`RpcError`]; no method
//!   silently substitutes a default value
//! - callers can always tell an expected miss ([`RpcError::NotFound`]) from a
//!   transport failure

use async_trait::async_trait;
use std::path::Path;

use crate::schema::{ImageRecord, OptimizeRequest, Settings, Tag};

pub mod error;
pub mod memory;

pub use error::RpcError;
pub use memory::InMemoryBackend;

/// The backend RPC surface, one method per operation.
///
/// Implementations must be shareable across tasks; all state lives behind
/// the implementor's own synchronization.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the canonical settings object (defaults on first load)
    async fn get_settings(&self) -> Result<Settings, RpcError>;

    /// Persist a complete settings object and return the stored (authoritative)
    /// version, which may differ from what was sent
    ///
    /// # Errors
    /// Returns `RpcError::Rejected` when validation fails; the previous
    /// settings remain in effect.
    async fn update_settings(&self, new_settings: Settings) -> Result<Settings, RpcError>;

    /// Register an image under a category and return its integer id
    ///
    /// Registration is an upsert: re-adding an existing `(path, category)`
    /// pair must not invalidate the previously assigned id.
    async fn add_image(&self, path: &Path, category: &str) -> Result<i64, RpcError>;

    /// Look up the id of an already registered image
    ///
    /// # Errors
    /// Returns `RpcError::NotFound` when the pair is not registered, an
    /// expected condition when used as a fallback after `add_image`.
    async fn get_image_id(&self, path: &Path, category: &str) -> Result<i64, RpcError>;

    /// Create a tag by name and return its id (idempotent on duplicate names)
    async fn add_tag(&self, name: &str) -> Result<i64, RpcError>;

    /// Associate a tag (created on demand) with an image
    ///
    /// # Errors
    /// Returns `RpcError::NotFound` when the image id is unknown.
    async fn tag_image(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError>;

    /// Tag names attached to an image; an empty list is a valid answer
    async fn get_image_tags(&self, image_id: i64) -> Result<Vec<String>, RpcError>;

    /// Images carrying *all* of the given tags; an empty match list is valid
    async fn search_images_by_tags(&self, tags: &[String]) -> Result<Vec<ImageRecord>, RpcError>;

    /// Detach a tag from an image; a no-op when the association did not exist
    async fn remove_image_tag(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError>;

    /// All tag records known to the backend
    async fn get_all_tags(&self) -> Result<Vec<Tag>, RpcError>;

    /// Produce an encoded preview payload for display
    async fn optimize_image(&self, request: OptimizeRequest) -> Result<Vec<u8>, RpcError>;
}
