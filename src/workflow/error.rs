//! Tag dialog workflow error types

use thiserror::Error;

use crate::rpc::RpcError;

/// Errors from the tag dialog workflow
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// The tag panel is not enabled (dialog closed, resolving, or unavailable)
    #[error("tag panel is not ready")]
    NotReady,

    /// Every image in the batch failed resolution; tag editing is unavailable
    #[error("no images could be resolved for tag editing")]
    NothingResolved,

    /// The dialog was closed while resolution was in flight; results discarded
    #[error("dialog closed before resolution finished")]
    Abandoned,

    /// The operation only applies to a dialog opened over a single image
    #[error("operation requires a single resolved image")]
    NotSingleImage,

    /// Some items in a batch operation failed; the rest were applied
    #[error("{failed} of {total} images failed")]
    PartialFailure { failed: usize, total: usize },

    /// A backend call failed before any per-item work started
    #[error(transparent)]
    Rpc(#[from] RpcError),
}
