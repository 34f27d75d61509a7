//! Canonical data model shared between the UI-facing services and the
//! backend boundary.
//!
//! All wire types live here so that every layer (settings store, database
//! façade, dialog workflow) agrees on a single schema:
//! - **`Settings`**: the one canonical user configuration object
//! - **`SettingsPatch`**: partial update merged over the canonical settings
//! - **`Tag` / `ImageRecord`**: backend-owned tag database rows
//! - **`FileEntry`**: read-only file projection assembled by the backend
//! - **`OptimizeRequest`**: parameters for the image optimization call
//!
//! Wire serialization is camelCase JSON to match the backend's config file
//! and command payloads.

mod types;

pub use types::{FileEntry, ImageRecord, OptimizeRequest, Settings, SettingsPatch, Tag};
