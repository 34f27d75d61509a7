//! lockerz-core - settings synchronization and tagging workflows for the
//! LockerZ image organizer
//!
//! The application core (settings persistence, the SQLite tag database, the
//! image encoder) runs in a separate native process. This crate is the
//! coordination layer in front of that boundary:
//!
//! - [`rpc`]: the [`rpc::Backend`] trait (one typed request/response method
//!   per backend operation) plus an in-memory reference implementation
//! - [`settings`]: the cached, backend-authoritative settings store shared
//!   across the session through a [`settings::SettingsHandle`]
//! - [`db`]: the typed façade over the image/tag database operations
//! - [`workflow`]: the tag dialog state machine, resolving image ids
//!   concurrently with per-image failure isolation
//! - [`media`]: settings-driven preview encoding
//! - [`notify`]: the notification channel services report outcomes through
//! - [`config`]: local client configuration (backend endpoint, quiet mode)

use thiserror::Error;

pub mod config;
pub mod db;
pub mod media;
pub mod notify;
pub mod rpc;
pub mod schema;
pub mod settings;
pub mod workflow;

#[cfg(test)]
pub mod testing;

pub use db::DatabaseService;
pub use notify::{Notification, Notify, Severity};
pub use rpc::{Backend, RpcError};
pub use schema::{FileEntry, ImageRecord, Settings, SettingsPatch, Tag};
pub use settings::{SettingsHandle, SettingsStore};
pub use workflow::{DialogState, TagDialog};

/// Error enum, contains all failure states of the crate
#[derive(Debug, Error)]
pub enum LockerzError {
    /// Backend boundary error
    #[error("Backend error: {0}")]
    Rpc(#[from] rpc::RpcError),
    /// Settings synchronization error
    #[error("Settings error: {0}")]
    Settings(#[from] settings::SettingsError),
    /// Tag dialog workflow error
    #[error("Workflow error: {0}")]
    Workflow(#[from] workflow::WorkflowError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
