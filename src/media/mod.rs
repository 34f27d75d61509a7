//! Settings-driven image preview
//!
//! Thin coordinator between the settings store and the backend's image
//! encoder: builds an [`OptimizeRequest`] from the cached settings (quality
//! and preview dimensions) and returns the encoded payload for display.

use std::path::Path;
use std::sync::Arc;

use crate::rpc::{Backend, RpcError};
use crate::schema::{OptimizeRequest, Settings};
use crate::settings::SettingsHandle;

/// Produces display-ready preview payloads sized per the user's settings
pub struct Optimizer {
    backend: Arc<dyn Backend>,
    settings: SettingsHandle,
}

impl Optimizer {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, settings: SettingsHandle) -> Self {
        Self { backend, settings }
    }

    /// Encode a preview of `src` using the current settings
    ///
    /// Falls back to the default settings when the initial fetch has not
    /// completed yet, so previews render even during startup.
    ///
    /// # Errors
    /// Returns `RpcError` when the source is missing or encoding fails.
    pub async fn preview(&self, src: &Path) -> Result<Vec<u8>, RpcError> {
        let settings = self.settings.settings().unwrap_or_default();
        self.backend
            .optimize_image(self.request_for(src, &settings))
            .await
    }

    fn request_for(&self, src: &Path, settings: &Settings) -> OptimizeRequest {
        OptimizeRequest {
            src: src.to_path_buf(),
            width: settings.image_width,
            height: settings.image_height,
            quality: settings.image_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::rpc::InMemoryBackend;
    use std::io::Write;

    #[tokio::test]
    async fn test_preview_round_trips_source_payload() {
        let mut src = tempfile::NamedTempFile::new().unwrap();
        src.write_all(b"fake png bytes").unwrap();

        let backend = Arc::new(InMemoryBackend::new());
        let handle = SettingsHandle::mount(backend.clone(), Arc::new(NullNotifier)).await;
        let optimizer = Optimizer::new(backend, handle);

        let payload = optimizer.preview(src.path()).await.unwrap();
        assert_eq!(payload, b"fake png bytes");
    }

    #[tokio::test]
    async fn test_preview_missing_source_is_not_found() {
        let backend = Arc::new(InMemoryBackend::new());
        let handle = SettingsHandle::mount(backend.clone(), Arc::new(NullNotifier)).await;
        let optimizer = Optimizer::new(backend, handle);

        let err = optimizer
            .preview(Path::new("/nonexistent/preview.png"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
