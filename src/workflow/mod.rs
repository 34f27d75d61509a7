//! Tag dialog workflow
//!
//! Orchestrates the dialog-driven tagging flow: when a dialog opens over one
//! or more files, every file must first be *resolved* (exchanged for the
//! backend's stable integer image id) before the tag panel may operate.
//!
//! Resolution is a fan-out of independent per-image requests joined with a
//! wait-for-all: individual failures exclude that image from the batch but
//! never abort it. The panel is enabled only when at least one id resolved.
//! Closing the dialog discards everything; reopening re-runs resolution from
//! scratch, because files and categories may have changed in the meantime.

use futures::future::join_all;
use log::{debug, warn};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::db::DatabaseService;
use crate::notify::{Notification, Notify};
use crate::schema::{FileEntry, Tag};

pub mod error;

pub use error::WorkflowError;

/// Dialog lifecycle states
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Not open; no resolution state is retained here
    #[default]
    Closed,
    /// Open, waiting for the resolution batch to settle
    Resolving,
    /// All resolutions settled with at least one id; tag panel enabled
    Ready { image_ids: Vec<i64> },
    /// Every resolution failed; the panel never renders
    Unavailable,
}

/// A tag manager dialog instance (single-image or bulk)
pub struct TagDialog {
    db: DatabaseService,
    notifier: Arc<dyn Notify>,
    state: Mutex<DialogState>,
    // Bumped on every open/close; a resolution batch whose generation is
    // stale by the time it settles discards its results.
    generation: AtomicU64,
}

impl TagDialog {
    #[must_use]
    pub fn new(db: DatabaseService, notifier: Arc<dyn Notify>) -> Self {
        Self {
            db,
            notifier,
            state: Mutex::new(DialogState::Closed),
            generation: AtomicU64::new(0),
        }
    }

    /// Open the dialog over a batch of files and resolve their image ids
    ///
    /// All resolutions are issued concurrently and the transition out of
    /// `Resolving` waits for every one of them to settle. Images that fail
    /// both registration and the fallback lookup are excluded; the returned
    /// ids preserve no particular order.
    ///
    /// # Errors
    /// - `NothingResolved` when every image failed (the dialog reports that
    ///   editing is unavailable)
    /// - `Abandoned` when the dialog was closed mid-resolution
    pub async fn open(&self, files: &[FileEntry]) -> Result<Vec<i64>, WorkflowError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.lock_state() = DialogState::Resolving;
        debug!("resolving {} image(s) for tag dialog", files.len());

        let resolutions = join_all(files.iter().map(|file| {
            let db = self.db.clone();
            async move {
                db.resolve_image(&file.filepath, &file.category)
                    .await
                    .map_err(|e| (file.filepath.clone(), e))
            }
        }))
        .await;

        let mut state = self.lock_state();
        if self.generation.load(Ordering::SeqCst) != generation {
            // Closed (or reopened) while we were resolving; whoever bumped
            // the generation owns the state now.
            debug!("discarding stale resolution batch");
            return Err(WorkflowError::Abandoned);
        }

        let mut image_ids = Vec::with_capacity(resolutions.len());
        for resolution in resolutions {
            match resolution {
                Ok(id) => image_ids.push(id),
                Err((path, e)) => {
                    warn!("excluding {} from tag batch: {e}", path.display());
                }
            }
        }

        if image_ids.is_empty() {
            *state = DialogState::Unavailable;
            self.notifier.notify(Notification::error(
                "Tag editing unavailable",
                "None of the selected images could be registered",
            ));
            return Err(WorkflowError::NothingResolved);
        }

        *state = DialogState::Ready {
            image_ids: image_ids.clone(),
        };
        Ok(image_ids)
    }

    /// Open the dialog over exactly one file
    ///
    /// # Errors
    /// Same conditions as [`TagDialog::open`].
    pub async fn open_single(&self, file: &FileEntry) -> Result<i64, WorkflowError> {
        let ids = self.open(std::slice::from_ref(file)).await?;
        Ok(ids[0])
    }

    /// Close the dialog, discarding all resolution state
    ///
    /// An in-flight resolution batch is abandoned: its results are dropped
    /// when it settles and the state stays `Closed`.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.lock_state() = DialogState::Closed;
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> DialogState {
        self.lock_state().clone()
    }

    /// Resolved ids when the panel is enabled
    #[must_use]
    pub fn image_ids(&self) -> Option<Vec<i64>> {
        match &*self.lock_state() {
            DialogState::Ready { image_ids } => Some(image_ids.clone()),
            _ => None,
        }
    }

    /// Whether the tag panel may render
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(&*self.lock_state(), DialogState::Ready { .. })
    }

    /// Attach a tag to every resolved image
    ///
    /// The tag is upserted once, then associated per image. A failure on one
    /// image skips that image only; the rest of the batch proceeds.
    ///
    /// # Errors
    /// - `NotReady` when the panel is not enabled
    /// - `Rpc` when the tag upsert itself fails (nothing was applied yet)
    /// - `PartialFailure` when some associations failed
    pub async fn apply_tag(&self, tag_name: &str) -> Result<(), WorkflowError> {
        let image_ids = self.ready_ids()?;
        self.db.add_tag(tag_name).await?;

        let mut failed = 0;
        for image_id in &image_ids {
            if let Err(e) = self.db.tag_image(*image_id, tag_name).await {
                warn!("failed to tag image {image_id} with '{tag_name}': {e}");
                failed += 1;
            }
        }
        self.finish_batch("Failed to apply tag", failed, image_ids.len())
    }

    /// Detach a tag from every resolved image
    ///
    /// Detaching from an image that never had the tag is a no-op, so the
    /// only per-item failures here are backend failures.
    ///
    /// # Errors
    /// - `NotReady` when the panel is not enabled
    /// - `PartialFailure` when some removals failed
    pub async fn remove_tag(&self, tag_name: &str) -> Result<(), WorkflowError> {
        let image_ids = self.ready_ids()?;

        let mut failed = 0;
        for image_id in &image_ids {
            if let Err(e) = self.db.remove_image_tag(*image_id, tag_name).await {
                warn!("failed to remove '{tag_name}' from image {image_id}: {e}");
                failed += 1;
            }
        }
        self.finish_batch("Failed to remove tag", failed, image_ids.len())
    }

    /// Tags of the resolved image (single-image dialogs only)
    ///
    /// # Errors
    /// - `NotReady` when the panel is not enabled
    /// - `NotSingleImage` for bulk dialogs
    pub async fn selected_tags(&self) -> Result<Vec<String>, WorkflowError> {
        let image_ids = self.ready_ids()?;
        match image_ids.as_slice() {
            [only] => Ok(self.db.image_tags(*only).await?),
            _ => Err(WorkflowError::NotSingleImage),
        }
    }

    /// All tags known to the backend, for the panel's suggestion list
    ///
    /// # Errors
    /// Returns `Rpc` when the backend call fails.
    pub async fn available_tags(&self) -> Result<Vec<Tag>, WorkflowError> {
        Ok(self.db.all_tags().await?)
    }

    fn ready_ids(&self) -> Result<Vec<i64>, WorkflowError> {
        self.image_ids().ok_or(WorkflowError::NotReady)
    }

    fn finish_batch(
        &self,
        title: &str,
        failed: usize,
        total: usize,
    ) -> Result<(), WorkflowError> {
        if failed == 0 {
            return Ok(());
        }
        self.notifier.notify(Notification::error(
            title,
            format!("{failed} of {total} images failed"),
        ));
        Err(WorkflowError::PartialFailure { failed, total })
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DialogState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
