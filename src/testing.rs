//! Testing utilities for lockerz-core
//!
//! Provides backend wrappers with failure injection and a recording
//! notifier, so unit tests can drive every partial-failure path without a
//! real backend process.
//!
//! Only available when compiled with `cfg(test)`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::Semaphore;

use crate::notify::{Notification, Notify};
use crate::rpc::{Backend, RpcError};
use crate::schema::{ImageRecord, OptimizeRequest, Settings, Tag};

#[derive(Debug, Default)]
struct Failures {
    get_settings: Option<RpcError>,
    update_settings: Option<RpcError>,
    add_image: Option<RpcError>,
    add_image_paths: HashMap<PathBuf, RpcError>,
    get_image_id: Option<RpcError>,
    tag_image_ids: HashMap<i64, RpcError>,
}

/// Backend wrapper that injects configured failures per operation
///
/// Unconfigured operations delegate to the wrapped backend, so a test can
/// mix real semantics (upserts, link table) with targeted failures.
pub struct FailingBackend<B> {
    inner: B,
    failures: Mutex<Failures>,
}

impl<B: Backend> FailingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            failures: Mutex::new(Failures::default()),
        }
    }

    /// The wrapped backend, for direct state assertions
    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn fail_get_settings(&self, error: RpcError) {
        self.lock().get_settings = Some(error);
    }

    pub fn fail_update_settings(&self, error: RpcError) {
        self.lock().update_settings = Some(error);
    }

    /// Fail every `add_image` call
    pub fn fail_add_image(&self, error: RpcError) {
        self.lock().add_image = Some(error);
    }

    /// Fail `add_image` only for the given path
    pub fn fail_add_image_for(&self, path: &Path, error: RpcError) {
        self.lock().add_image_paths.insert(path.to_path_buf(), error);
    }

    pub fn fail_get_image_id(&self, error: RpcError) {
        self.lock().get_image_id = Some(error);
    }

    /// Fail `tag_image` only for the given image id
    pub fn fail_tag_image_for(&self, image_id: i64, error: RpcError) {
        self.lock().tag_image_ids.insert(image_id, error);
    }

    /// Drop all configured failures (backend "recovers")
    pub fn clear_failures(&self) {
        *self.lock() = Failures::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Failures> {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl<B: Backend> Backend for FailingBackend<B> {
    async fn get_settings(&self) -> Result<Settings, RpcError> {
        if let Some(e) = self.lock().get_settings.clone() {
            return Err(e);
        }
        self.inner.get_settings().await
    }

    async fn update_settings(&self, new_settings: Settings) -> Result<Settings, RpcError> {
        if let Some(e) = self.lock().update_settings.clone() {
            return Err(e);
        }
        self.inner.update_settings(new_settings).await
    }

    async fn add_image(&self, path: &Path, category: &str) -> Result<i64, RpcError> {
        {
            let failures = self.lock();
            if let Some(e) = failures.add_image_paths.get(path) {
                return Err(e.clone());
            }
            if let Some(e) = failures.add_image.clone() {
                return Err(e);
            }
        }
        self.inner.add_image(path, category).await
    }

    async fn get_image_id(&self, path: &Path, category: &str) -> Result<i64, RpcError> {
        if let Some(e) = self.lock().get_image_id.clone() {
            return Err(e);
        }
        self.inner.get_image_id(path, category).await
    }

    async fn add_tag(&self, name: &str) -> Result<i64, RpcError> {
        self.inner.add_tag(name).await
    }

    async fn tag_image(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        if let Some(e) = self.lock().tag_image_ids.get(&image_id).cloned() {
            return Err(e);
        }
        self.inner.tag_image(image_id, tag_name).await
    }

    async fn get_image_tags(&self, image_id: i64) -> Result<Vec<String>, RpcError> {
        self.inner.get_image_tags(image_id).await
    }

    async fn search_images_by_tags(&self, tags: &[String]) -> Result<Vec<ImageRecord>, RpcError> {
        self.inner.search_images_by_tags(tags).await
    }

    async fn remove_image_tag(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        self.inner.remove_image_tag(image_id, tag_name).await
    }

    async fn get_all_tags(&self) -> Result<Vec<Tag>, RpcError> {
        self.inner.get_all_tags().await
    }

    async fn optimize_image(&self, request: OptimizeRequest) -> Result<Vec<u8>, RpcError> {
        self.inner.optimize_image(request).await
    }
}

/// Backend wrapper whose `add_image` blocks until explicitly released
///
/// Used to hold a resolution batch in flight so tests can interleave other
/// calls (closing the dialog, for instance) deterministically.
pub struct GatedBackend<B> {
    inner: B,
    gate: Semaphore,
}

impl<B: Backend> GatedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
        }
    }

    /// Allow `n` pending or future `add_image` calls to proceed
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl<B: Backend> Backend for GatedBackend<B> {
    async fn get_settings(&self) -> Result<Settings, RpcError> {
        self.inner.get_settings().await
    }

    async fn update_settings(&self, new_settings: Settings) -> Result<Settings, RpcError> {
        self.inner.update_settings(new_settings).await
    }

    async fn add_image(&self, path: &Path, category: &str) -> Result<i64, RpcError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| RpcError::Transport("gate closed".to_string()))?;
        permit.forget();
        self.inner.add_image(path, category).await
    }

    async fn get_image_id(&self, path: &Path, category: &str) -> Result<i64, RpcError> {
        self.inner.get_image_id(path, category).await
    }

    async fn add_tag(&self, name: &str) -> Result<i64, RpcError> {
        self.inner.add_tag(name).await
    }

    async fn tag_image(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        self.inner.tag_image(image_id, tag_name).await
    }

    async fn get_image_tags(&self, image_id: i64) -> Result<Vec<String>, RpcError> {
        self.inner.get_image_tags(image_id).await
    }

    async fn search_images_by_tags(&self, tags: &[String]) -> Result<Vec<ImageRecord>, RpcError> {
        self.inner.search_images_by_tags(tags).await
    }

    async fn remove_image_tag(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        self.inner.remove_image_tag(image_id, tag_name).await
    }

    async fn get_all_tags(&self) -> Result<Vec<Tag>, RpcError> {
        self.inner.get_all_tags().await
    }

    async fn optimize_image(&self, request: OptimizeRequest) -> Result<Vec<u8>, RpcError> {
        self.inner.optimize_image(request).await
    }
}

/// Notifier that records everything it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// All notifications received so far, oldest first
    pub fn all(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// The most recent notification, if any
    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Notify for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}
