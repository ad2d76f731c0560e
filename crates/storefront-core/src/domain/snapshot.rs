//! Persisted state of one storefront's menu and the writes that change it

use serde::Serialize;
use uuid::Uuid;

use super::menu_item::MenuItem;
use super::navigation::NavigationTree;

/// All menu items of a storefront at a given revision
#[derive(Debug, Clone, Serialize)]
pub struct MenuSnapshot {
    pub storefront_id: Uuid,
    /// Bumped by one on every committed change; 0 for a storefront never written
    pub revision: i64,
    pub items: Vec<MenuItem>,
}

impl MenuSnapshot {
    pub fn empty(storefront_id: Uuid) -> Self {
        Self {
            storefront_id,
            revision: 0,
            items: Vec::new(),
        }
    }
}

/// Rows to write back in one transaction
#[derive(Debug, Clone, Default)]
pub struct MenuChangeSet {
    pub upserts: Vec<MenuItem>,
    pub deletes: Vec<Uuid>,
}

impl MenuChangeSet {
    /// Collects the current state of `changed` rows from the tree.
    pub fn collect(tree: &NavigationTree, changed: &[Uuid], deleted: &[Uuid]) -> Self {
        Self {
            upserts: changed
                .iter()
                .filter_map(|id| tree.get(*id).cloned())
                .collect(),
            deletes: deleted.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.upserts.len() + self.deletes.len()
    }
}
