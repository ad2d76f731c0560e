//! Menu repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{MenuChangeSet, MenuSnapshot};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// All items of the storefront with the current revision.
    ///
    /// A storefront that was never written is an empty snapshot at revision 0.
    async fn load_snapshot(&self, storefront_id: &Uuid) -> Result<MenuSnapshot, DomainError>;

    /// Applies the change set atomically and returns the new revision.
    ///
    /// Fails with `DomainError::ConcurrentModification` without writing
    /// anything when the stored revision is not `expected_revision`.
    async fn commit(
        &self,
        storefront_id: &Uuid,
        expected_revision: i64,
        changes: &MenuChangeSet,
    ) -> Result<i64, DomainError>;
}
