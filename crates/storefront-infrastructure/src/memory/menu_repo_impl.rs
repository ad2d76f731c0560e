// ============================================================================
// Storefront Infrastructure - In-Memory Menu Repository
// File: crates/storefront-infrastructure/src/memory/menu_repo_impl.rs
// ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use storefront_core::domain::{MenuChangeSet, MenuItem, MenuSnapshot};
use storefront_core::error::DomainError;
use storefront_core::repositories::MenuRepository;

#[derive(Debug, Default)]
struct StoredMenu {
    revision: i64,
    items: Vec<MenuItem>,
}

/// Menus held in process memory, lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryMenuRepository {
    menus: RwLock<HashMap<Uuid, StoredMenu>>,
}

impl InMemoryMenuRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a storefront with existing rows, stored as-is at revision 0.
    pub fn with_items(mut self, storefront_id: Uuid, items: Vec<MenuItem>) -> Self {
        self.menus
            .get_mut()
            .insert(storefront_id, StoredMenu { revision: 0, items });
        self
    }
}

#[async_trait]
impl MenuRepository for InMemoryMenuRepository {
    async fn load_snapshot(&self, storefront_id: &Uuid) -> Result<MenuSnapshot, DomainError> {
        let menus = self.menus.read().await;
        Ok(match menus.get(storefront_id) {
            Some(menu) => MenuSnapshot {
                storefront_id: *storefront_id,
                revision: menu.revision,
                items: menu.items.clone(),
            },
            None => MenuSnapshot::empty(*storefront_id),
        })
    }

    async fn commit(
        &self,
        storefront_id: &Uuid,
        expected_revision: i64,
        changes: &MenuChangeSet,
    ) -> Result<i64, DomainError> {
        let mut menus = self.menus.write().await;
        let menu = menus.entry(*storefront_id).or_default();

        if menu.revision != expected_revision {
            warn!(
                "Storefront {} menu moved from revision {} to {}; refusing stale write",
                storefront_id, expected_revision, menu.revision
            );
            return Err(DomainError::ConcurrentModification);
        }

        for item in &changes.upserts {
            match menu.items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => menu.items.push(item.clone()),
            }
        }
        menu.items.retain(|item| !changes.deletes.contains(&item.id));
        menu.revision += 1;

        debug!(
            "Committed {} change(s) to storefront {} at revision {}",
            changes.len(),
            storefront_id,
            menu.revision
        );
        Ok(menu.revision)
    }
}
