use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canonical user configuration.
///
/// Exactly one instance exists per running application; the backend owns
/// persistence and supplies defaults on first load. Every field is always
/// populated; partial states never exist on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Root folder the organizer manages
    pub folder_path: PathBuf,
    /// Reopen the last selected category on startup
    pub remember_category: bool,
    /// UI language code (e.g., "en", "th")
    pub lang: String,
    /// JPEG/WebP quality for optimized previews, 1..=100
    pub image_quality: u8,
    /// Preview width in pixels
    pub image_width: u32,
    /// Preview height in pixels
    pub image_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder_path: PathBuf::new(),
            remember_category: false,
            lang: "en".to_string(),
            image_quality: 100,
            image_width: 300,
            image_height: 450,
        }
    }
}

impl Settings {
    /// Validate the numeric bounds the backend enforces
    ///
    /// # Errors
    /// Returns a human-readable message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.image_quality == 0 || self.image_quality > 100 {
            return Err(format!(
                "imageQuality must be within 1..=100, got {}",
                self.image_quality
            ));
        }
        if self.image_width == 0 {
            return Err("imageWidth must be greater than zero".to_string());
        }
        if self.image_height == 0 {
            return Err("imageHeight must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Partial settings update.
///
/// Fields left as `None` keep their current canonical value when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_category: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
}

impl SettingsPatch {
    /// Merge this patch over a base settings object
    ///
    /// Present fields win; absent fields keep the base value.
    #[must_use]
    pub fn apply(&self, base: Settings) -> Settings {
        Settings {
            folder_path: self.folder_path.clone().unwrap_or(base.folder_path),
            remember_category: self.remember_category.unwrap_or(base.remember_category),
            lang: self.lang.clone().unwrap_or(base.lang),
            image_quality: self.image_quality.unwrap_or(base.image_quality),
            image_width: self.image_width.unwrap_or(base.image_width),
            image_height: self.image_height.unwrap_or(base.image_height),
        }
    }

    /// Patch that only changes the UI language
    #[must_use]
    pub fn lang(lang: impl Into<String>) -> Self {
        Self {
            lang: Some(lang.into()),
            ..Self::default()
        }
    }
}

/// A tag row from the backend tag database.
///
/// Category-flagged tags are rendered in a separate visual group but are
/// structurally identical to plain tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub is_category: bool,
}

/// A registered image row, identified externally by `(filepath, category)`
/// and internally by a backend-assigned integer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub relative_path: String,
    pub category: String,
    pub filename: String,
}

/// Read-only file projection assembled by the backend.
///
/// Consumers only display these fields, never compute them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub category: String,
    pub filepath: PathBuf,
    pub size: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl FileEntry {
    /// Minimal entry for a path/category pair, timestamps at now
    ///
    /// Convenient for callers that only have the identity fields (the
    /// workflow resolves ids from `filepath` + `category` alone).
    #[must_use]
    pub fn new(filepath: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        let filepath = filepath.into();
        let name = filepath
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let now = Utc::now();
        Self {
            name,
            category: category.into(),
            filepath,
            size: 0,
            tags: Vec::new(),
            last_modified: now,
            created_at: now,
        }
    }
}

/// Parameters for the backend image optimization call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub src: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}
