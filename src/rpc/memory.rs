//! In-memory reference backend
//!
//! A complete [`Backend`] implementation backed by plain maps, mirroring the
//! native backend's SQLite semantics: images are unique per
//! `(filepath, category)` pair, tags are unique by name, associations form a
//! many-to-many link table, and tag search is an AND over tag names.
//!
//! Used as the development/test stand-in for the native process; image
//! optimization returns the source bytes unmodified.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Backend, RpcError};
use crate::schema::{ImageRecord, OptimizeRequest, Settings, Tag};

#[derive(Debug, Clone)]
struct StoredImage {
    id: i64,
    filepath: PathBuf,
    category: String,
}

#[derive(Debug, Default)]
struct State {
    settings: Settings,
    images: Vec<StoredImage>,
    tags: BTreeMap<i64, Tag>,
    // (image_id, tag_id) link table
    links: HashSet<(i64, i64)>,
    next_image_id: i64,
    next_tag_id: i64,
}

impl State {
    fn new() -> Self {
        Self {
            next_image_id: 1,
            next_tag_id: 1,
            ..Self::default()
        }
    }

    fn image_id(&self, path: &Path, category: &str) -> Option<i64> {
        self.images
            .iter()
            .find(|img| img.filepath == path && img.category == category)
            .map(|img| img.id)
    }

    fn tag_id(&self, name: &str) -> Option<i64> {
        self.tags
            .values()
            .find(|tag| tag.name == name)
            .map(|tag| tag.id)
    }

    fn upsert_tag(&mut self, name: &str) -> i64 {
        if let Some(id) = self.tag_id(name) {
            return id;
        }
        let id = self.next_tag_id;
        self.next_tag_id += 1;
        self.tags.insert(
            id,
            Tag {
                id,
                name: name.to_string(),
                is_category: false,
            },
        );
        id
    }

    fn record(&self, image: &StoredImage) -> ImageRecord {
        let filename = image
            .filepath
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative_path = image
            .filepath
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        ImageRecord {
            id: image.id,
            relative_path,
            category: image.category.clone(),
            filename,
        }
    }
}

/// In-memory [`Backend`] with the native backend's tag database semantics
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    /// Backend starting from default settings and an empty tag database
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::new()),
        }
    }

    /// Backend starting from the given settings
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        let backend = Self::new();
        backend.lock().settings = settings;
        backend
    }

    /// Mark an existing tag as a category tag
    ///
    /// Category tags are structurally identical; the flag only drives visual
    /// grouping in consumers.
    pub fn set_category_flag(&self, name: &str, is_category: bool) {
        let mut state = self.lock();
        if let Some(id) = state.tag_id(name) {
            if let Some(tag) = state.tags.get_mut(&id) {
                tag.is_category = is_category;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // Lock poisoning only occurs if a panic happened while holding the
        // guard; recover the inner state rather than cascading the panic.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn get_settings(&self) -> Result<Settings, RpcError> {
        Ok(self.lock().settings.clone())
    }

    async fn update_settings(&self, new_settings: Settings) -> Result<Settings, RpcError> {
        new_settings.validate().map_err(RpcError::Rejected)?;
        let mut state = self.lock();
        state.settings = new_settings;
        Ok(state.settings.clone())
    }

    async fn add_image(&self, path: &Path, category: &str) -> Result<i64, RpcError> {
        let mut state = self.lock();
        if let Some(id) = state.image_id(path, category) {
            return Ok(id);
        }
        let id = state.next_image_id;
        state.next_image_id += 1;
        state.images.push(StoredImage {
            id,
            filepath: path.to_path_buf(),
            category: category.to_string(),
        });
        Ok(id)
    }

    async fn get_image_id(&self, path: &Path, category: &str) -> Result<i64, RpcError> {
        self.lock().image_id(path, category).ok_or_else(|| {
            RpcError::NotFound(format!("image {} in category {category}", path.display()))
        })
    }

    async fn add_tag(&self, name: &str) -> Result<i64, RpcError> {
        Ok(self.lock().upsert_tag(name))
    }

    async fn tag_image(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        let mut state = self.lock();
        if !state.images.iter().any(|img| img.id == image_id) {
            return Err(RpcError::NotFound(format!("image id {image_id}")));
        }
        let tag_id = state.upsert_tag(tag_name);
        state.links.insert((image_id, tag_id));
        Ok(())
    }

    async fn get_image_tags(&self, image_id: i64) -> Result<Vec<String>, RpcError> {
        let state = self.lock();
        let mut names: Vec<String> = state
            .links
            .iter()
            .filter(|(img, _)| *img == image_id)
            .filter_map(|(_, tag_id)| state.tags.get(tag_id).map(|t| t.name.clone()))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn search_images_by_tags(&self, tags: &[String]) -> Result<Vec<ImageRecord>, RpcError> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let state = self.lock();
        let wanted: Vec<i64> = tags
            .iter()
            .filter_map(|name| state.tag_id(name))
            .collect();
        // An unknown tag name can never match anything.
        if wanted.len() != tags.len() {
            return Ok(Vec::new());
        }
        Ok(state
            .images
            .iter()
            .filter(|img| wanted.iter().all(|tag| state.links.contains(&(img.id, *tag))))
            .map(|img| state.record(img))
            .collect())
    }

    async fn remove_image_tag(&self, image_id: i64, tag_name: &str) -> Result<(), RpcError> {
        let mut state = self.lock();
        if let Some(tag_id) = state.tag_id(tag_name) {
            state.links.remove(&(image_id, tag_id));
        }
        Ok(())
    }

    async fn get_all_tags(&self) -> Result<Vec<Tag>, RpcError> {
        Ok(self.lock().tags.values().cloned().collect())
    }

    async fn optimize_image(&self, request: OptimizeRequest) -> Result<Vec<u8>, RpcError> {
        if request.quality == 0 || request.quality > 100 {
            return Err(RpcError::Rejected(format!(
                "quality must be within 1..=100, got {}",
                request.quality
            )));
        }
        std::fs::read(&request.src).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RpcError::NotFound(format!("source image {}", request.src.display()))
            } else {
                RpcError::Transport(format!("failed to read {}: {e}", request.src.display()))
            }
        })
    }
}
