//! Settings synchronization store
//!
//! Owns the locally cached copy of the canonical user configuration and keeps
//! it in sync with the backend. The backend is the single source of truth:
//! a successful update replaces the cache with the backend's *returned*
//! object, never with the locally computed merge, and a failed call leaves
//! the cache exactly as it was.
//!
//! One [`SettingsStore`] exists per application session. Consumers receive a
//! [`SettingsHandle`] by construction (dependency injection): holding the
//! handle *is* the proof the store exists, so there is no "used outside
//! provider" failure mode to check at runtime.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::notify::{Notification, Notify};
use crate::rpc::Backend;
use crate::schema::{Settings, SettingsPatch};

pub mod error;

pub use error::SettingsError;

/// Cached canonical settings synchronized with the backend
pub struct SettingsStore {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notify>,
    // Never held across an await point.
    cached: Mutex<Option<Settings>>,
    loading: AtomicBool,
}

impl SettingsStore {
    /// Create a store with an empty cache
    ///
    /// Call [`SettingsStore::fetch`] (or construct via
    /// [`SettingsHandle::mount`]) to populate it.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, notifier: Arc<dyn Notify>) -> Self {
        Self {
            backend,
            notifier,
            cached: Mutex::new(None),
            loading: AtomicBool::new(true),
        }
    }

    /// Fetch the canonical settings from the backend
    ///
    /// On success the cache is replaced wholesale. On failure the previous
    /// cache is kept, an error notification is emitted, and the error is
    /// returned. The loading flag clears on both paths, so consumers are
    /// never stuck in a loading state.
    ///
    /// # Errors
    /// Returns `SettingsError::Backend` when the fetch call fails.
    pub async fn fetch(&self) -> Result<Settings, SettingsError> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.backend.get_settings().await;
        self.loading.store(false, Ordering::SeqCst);

        match result {
            Ok(settings) => {
                debug!("fetched settings: lang={}", settings.lang);
                self.replace_cache(settings.clone());
                Ok(settings)
            }
            Err(e) => {
                warn!("settings fetch failed: {e}");
                self.notifier
                    .notify(Notification::error("Failed to fetch settings", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Merge a partial update over the canonical settings and persist it
    ///
    /// The canonical object is re-fetched first so a stale local cache cannot
    /// clobber concurrent external changes. The cache then takes the value
    /// the backend returns, the authoritative object, even if the backend
    /// silently adjusted a field. Concurrent updates are not queued; the
    /// backend's last write wins.
    ///
    /// # Errors
    /// Returns `SettingsError::Backend` when either call fails; the cache is
    /// left at its pre-update value in that case.
    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, SettingsError> {
        let result = self.push_merged(patch).await;

        match result {
            Ok(settings) => {
                self.replace_cache(settings.clone());
                self.notifier.notify(Notification::success(
                    "Settings saved",
                    "Your settings have been updated",
                ));
                Ok(settings)
            }
            Err(e) => {
                warn!("settings update failed: {e}");
                self.notifier
                    .notify(Notification::error("Failed to save settings", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// The cached settings, `None` before the first successful fetch
    #[must_use]
    pub fn settings(&self) -> Option<Settings> {
        self.lock_cache().clone()
    }

    /// Whether a fetch is currently in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    async fn push_merged(&self, patch: SettingsPatch) -> Result<Settings, crate::rpc::RpcError> {
        let current = self.backend.get_settings().await?;
        let merged = patch.apply(current);
        self.backend.update_settings(merged).await
    }

    fn replace_cache(&self, settings: Settings) {
        *self.lock_cache() = Some(settings);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Option<Settings>> {
        self.cached
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Cheaply clonable handle to the session's single [`SettingsStore`]
///
/// Pass this to any component that reads or writes settings.
#[derive(Clone)]
pub struct SettingsHandle(Arc<SettingsStore>);

impl SettingsHandle {
    /// Construct the store and run the fire-and-once initial fetch
    ///
    /// A failed initial fetch is notified through the store's notifier and
    /// the handle is still returned usable (consumers see `None` until a
    /// later fetch succeeds).
    pub async fn mount(backend: Arc<dyn Backend>, notifier: Arc<dyn Notify>) -> Self {
        let store = Arc::new(SettingsStore::new(backend, notifier));
        let _ = store.fetch().await;
        Self(store)
    }

    /// Wrap an existing store without fetching
    #[must_use]
    pub fn from_store(store: Arc<SettingsStore>) -> Self {
        Self(store)
    }
}

impl std::ops::Deref for SettingsHandle {
    type Target = SettingsStore;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;
    use crate::rpc::{InMemoryBackend, RpcError};
    use crate::testing::{FailingBackend, RecordingNotifier};
    use std::path::PathBuf;

    fn store_over(backend: Arc<dyn Backend>) -> (SettingsStore, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (SettingsStore::new(backend, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_fetch_populates_cache_and_clears_loading() {
        let (store, _) = store_over(Arc::new(InMemoryBackend::new()));
        assert!(store.settings().is_none());
        assert!(store.is_loading());

        store.fetch().await.unwrap();

        assert_eq!(store.settings(), Some(Settings::default()));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_cache_and_notifies() {
        let backend = Arc::new(FailingBackend::new(InMemoryBackend::new()));
        let (store, notifier) = store_over(backend.clone());
        store.fetch().await.unwrap();

        backend.fail_get_settings(RpcError::Transport("pipe closed".into()));
        let err = store.fetch().await.unwrap_err();

        assert!(matches!(err, SettingsError::Backend(RpcError::Transport(_))));
        assert_eq!(store.settings(), Some(Settings::default()));
        assert!(!store.is_loading());

        let last = notifier.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.title, "Failed to fetch settings");
        assert!(last.detail.contains("pipe closed"));
    }

    #[tokio::test]
    async fn test_update_takes_backend_response_as_truth() {
        let (store, notifier) = store_over(Arc::new(InMemoryBackend::with_settings(Settings {
            folder_path: PathBuf::from("/a"),
            remember_category: true,
            lang: "en".into(),
            image_quality: 85,
            image_width: 800,
            image_height: 600,
        })));
        store.fetch().await.unwrap();

        let saved = store.update(SettingsPatch::lang("th")).await.unwrap();

        assert_eq!(saved.lang, "th");
        let cached = store.settings().unwrap();
        assert_eq!(cached.lang, "th");
        assert_eq!(cached.folder_path, PathBuf::from("/a"));
        assert!(cached.remember_category);
        assert_eq!(cached.image_quality, 85);
        assert_eq!(cached.image_width, 800);
        assert_eq!(cached.image_height, 600);

        let last = notifier.last().unwrap();
        assert_eq!(last.severity, Severity::Success);
        assert_eq!(last.title, "Settings saved");
    }

    #[tokio::test]
    async fn test_update_merges_over_fresh_canonical_not_stale_cache() {
        let backend = Arc::new(InMemoryBackend::new());
        let (store, _) = store_over(backend.clone());
        store.fetch().await.unwrap();

        // External change after our fetch.
        let mut external = backend.get_settings().await.unwrap();
        external.image_quality = 42;
        backend.update_settings(external).await.unwrap();

        let saved = store.update(SettingsPatch::lang("th")).await.unwrap();

        // The concurrent external change survives the patch.
        assert_eq!(saved.image_quality, 42);
        assert_eq!(saved.lang, "th");
    }

    #[tokio::test]
    async fn test_update_failure_leaves_cache_untouched() {
        let backend = Arc::new(FailingBackend::new(InMemoryBackend::new()));
        let (store, notifier) = store_over(backend.clone());
        store.fetch().await.unwrap();
        let before = store.settings();

        backend.fail_update_settings(RpcError::Transport("pipe closed".into()));
        let err = store.update(SettingsPatch::lang("th")).await.unwrap_err();

        assert!(matches!(err, SettingsError::Backend(_)));
        assert_eq!(store.settings(), before);

        let last = notifier.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.title, "Failed to save settings");
    }

    #[tokio::test]
    async fn test_rejected_update_passes_backend_message_through() {
        let (store, _) = store_over(Arc::new(InMemoryBackend::new()));
        store.fetch().await.unwrap();

        let patch = SettingsPatch {
            image_quality: Some(0),
            ..SettingsPatch::default()
        };
        let err = store.update(patch).await.unwrap_err();

        assert!(matches!(
            err,
            SettingsError::Backend(RpcError::Rejected(ref msg)) if msg.contains("imageQuality")
        ));
        assert_eq!(store.settings().unwrap().image_quality, 100);
    }

    #[tokio::test]
    async fn test_mount_survives_failed_initial_fetch() {
        let backend = Arc::new(FailingBackend::new(InMemoryBackend::new()));
        backend.fail_get_settings(RpcError::Transport("not started".into()));
        let notifier = Arc::new(RecordingNotifier::default());

        let handle = SettingsHandle::mount(backend.clone(), notifier.clone()).await;

        assert!(handle.settings().is_none());
        assert!(!handle.is_loading());
        assert_eq!(notifier.last().unwrap().severity, Severity::Error);

        // Recovers on the next fetch.
        backend.clear_failures();
        handle.fetch().await.unwrap();
        assert!(handle.settings().is_some());
    }
}
