//! Domain errors

use thiserror::Error;
use uuid::Uuid;

/// Why a structural change to a navigation menu was refused.
///
/// These are expected outcomes of user actions, never system failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("A menu item cannot be its own parent")]
    SelfParent,

    #[error("Cannot move a parent into its own child")]
    Cycle,

    #[error("Target parent menu item does not exist")]
    UnknownTarget,

    #[error("Menu cannot be nested deeper than {max_depth} levels")]
    DepthExceeded { max_depth: usize },

    #[error("Reordered menu items must share the same parent")]
    MixedParents,

    #[error("Menu item listed more than once: {0}")]
    DuplicateItem(Uuid),

    #[error("Menu item missing from structure: {0}")]
    MissingItem(Uuid),

    #[error("Menu item does not exist: {0}")]
    UnknownItem(Uuid),
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::SelfParent => "self-parent",
            RejectionReason::Cycle => "cycle",
            RejectionReason::UnknownTarget => "unknown-target",
            RejectionReason::DepthExceeded { .. } => "depth-exceeded",
            RejectionReason::MixedParents => "mixed-parents",
            RejectionReason::DuplicateItem(_) => "duplicate-item",
            RejectionReason::MissingItem(_) => "missing-item",
            RejectionReason::UnknownItem(_) => "unknown-item",
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(Uuid),

    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Menu was modified concurrently, please try again")]
    ConcurrentModification,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::ValidationError(errors.to_string())
    }
}
