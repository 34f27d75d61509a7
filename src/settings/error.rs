//! Settings-specific error types

use thiserror::Error;

use crate::rpc::RpcError;

/// Errors from settings synchronization
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The backend call failed; the local cache was left untouched
    #[error("settings backend call failed: {0}")]
    Backend(#[from] RpcError),
}
