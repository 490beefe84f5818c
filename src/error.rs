use crate::dom::NodeId;
use thiserror::Error;

/// Errors surfaced by the exploration engine and its collaborators.
///
/// Almost every condition met during a run is absorbed locally (stale
/// triggers, refused navigation, exhausted budgets). What reaches the caller
/// is either a precondition failure or a failure of an outer collaborator.
#[derive(Debug, Error)]
pub enum XrayError {
    /// The host tree exposes no readable root
    #[error("root tree is unavailable")]
    RootUnavailable,

    /// A node handle does not belong to the tree it was used with
    #[error("invalid node {0}")]
    InvalidNode(NodeId),

    /// Structural operation rejected by the tree
    #[error("tree operation failed: {0}")]
    TreeOperation(String),

    /// The document URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Output payload could not be produced
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persistence collaborator refused the payload
    #[error("export to {target} failed: {reason}")]
    Export { target: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, XrayError>;
