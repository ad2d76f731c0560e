// ============================================================================
// Storefront Core - Navigation Service
// File: crates/storefront-core/src/services/navigation_service.rs
// ============================================================================
//! Request-scoped read-validate-write over a storefront's navigation menu

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    MenuChangeSet, MenuItem, MenuItemPatch, NavigationTree, NewMenuItem, StructureEntry, TreeNode,
};
use crate::error::DomainError;
use crate::repositories::MenuRepository;

/// Navigation service for building and restructuring storefront menus.
///
/// Mutations on one storefront run one at a time inside this process. The
/// repository's revision check covers writers in other processes.
pub struct NavigationService<R: ?Sized> {
    menu_repo: Arc<R>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    max_depth: Option<usize>,
}

/// Read-only view of a storefront menu
#[derive(Debug, Clone, Serialize)]
pub struct NavigationView {
    pub storefront_id: Uuid,
    pub revision: i64,
    pub tree: Vec<TreeNode>,
}

/// Result of a successful mutation
#[derive(Debug, Clone, Serialize)]
pub struct NavigationUpdate<T = ()> {
    pub outcome: T,
    pub revision: i64,
    /// Rows rewritten by this mutation; empty for a no-op
    pub changed: Vec<Uuid>,
    pub deleted: Vec<Uuid>,
    pub tree: Vec<TreeNode>,
}

struct Mutation<T> {
    outcome: T,
    changed: Vec<Uuid>,
    deleted: Vec<Uuid>,
}

impl<T> Mutation<T> {
    fn new(outcome: T, changed: Vec<Uuid>) -> Self {
        Self {
            outcome,
            changed,
            deleted: Vec::new(),
        }
    }
}

impl<R: MenuRepository + ?Sized> NavigationService<R> {
    pub fn new(menu_repo: Arc<R>, max_depth: Option<usize>) -> Self {
        Self {
            menu_repo,
            locks: DashMap::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Full tree including hidden items
    pub async fn get_tree(&self, storefront_id: Uuid) -> Result<NavigationView, DomainError> {
        let snapshot = self.menu_repo.load_snapshot(&storefront_id).await?;
        let tree = NavigationTree::new(storefront_id, snapshot.items, self.max_depth);
        Ok(NavigationView {
            storefront_id,
            revision: snapshot.revision,
            tree: tree.build(),
        })
    }

    /// Tree as storefront visitors see it
    pub async fn get_public_tree(&self, storefront_id: Uuid) -> Result<NavigationView, DomainError> {
        let snapshot = self.menu_repo.load_snapshot(&storefront_id).await?;
        let tree = NavigationTree::new(storefront_id, snapshot.items, self.max_depth);
        Ok(NavigationView {
            storefront_id,
            revision: snapshot.revision,
            tree: tree.build_public(),
        })
    }

    pub async fn create_item(
        &self,
        storefront_id: Uuid,
        input: NewMenuItem,
    ) -> Result<NavigationUpdate<MenuItem>, DomainError> {
        let item = MenuItem::new(storefront_id, input)?;
        let item_id = item.id;
        info!("Creating menu item {} in storefront {}", item_id, storefront_id);

        self.mutate(storefront_id, "create", None, move |tree| {
            let changed = tree.insert(item)?;
            let created = current_item(tree, item_id)?;
            Ok(Mutation::new(created, changed))
        })
        .await
    }

    pub async fn update_item(
        &self,
        storefront_id: Uuid,
        item_id: Uuid,
        patch: MenuItemPatch,
    ) -> Result<NavigationUpdate<MenuItem>, DomainError> {
        self.mutate(storefront_id, "update", None, move |tree| {
            let changed = tree.edit(item_id, &patch)?;
            let updated = current_item(tree, item_id)?;
            Ok(Mutation::new(updated, changed))
        })
        .await
    }

    /// Moves an item and its subtree under `new_parent_id` (`None` = top level).
    pub async fn reparent(
        &self,
        storefront_id: Uuid,
        item_id: Uuid,
        new_parent_id: Option<Uuid>,
        position: Option<usize>,
    ) -> Result<NavigationUpdate, DomainError> {
        info!(
            "Reparent request: item {} -> {:?} in storefront {}",
            item_id, new_parent_id, storefront_id
        );

        self.mutate(storefront_id, "reparent", None, move |tree| {
            let changed = tree.reparent(item_id, new_parent_id, position)?;
            Ok(Mutation::new((), changed))
        })
        .await
    }

    pub async fn promote(
        &self,
        storefront_id: Uuid,
        item_id: Uuid,
    ) -> Result<NavigationUpdate, DomainError> {
        self.mutate(storefront_id, "promote", None, move |tree| {
            let changed = tree.promote(item_id)?;
            Ok(Mutation::new((), changed))
        })
        .await
    }

    pub async fn reorder(
        &self,
        storefront_id: Uuid,
        sibling_ids: Vec<Uuid>,
    ) -> Result<NavigationUpdate, DomainError> {
        self.mutate(storefront_id, "reorder", None, move |tree| {
            let changed = tree.reorder(&sibling_ids)?;
            Ok(Mutation::new((), changed))
        })
        .await
    }

    /// Deletes an item; its children are promoted to its former parent.
    pub async fn delete_item(
        &self,
        storefront_id: Uuid,
        item_id: Uuid,
    ) -> Result<NavigationUpdate<MenuItem>, DomainError> {
        info!("Deleting menu item {} in storefront {}", item_id, storefront_id);

        self.mutate(storefront_id, "delete", None, move |tree| {
            let removal = tree.remove(item_id)?;
            Ok(Mutation {
                outcome: removal.removed,
                changed: removal.changed,
                deleted: vec![item_id],
            })
        })
        .await
    }

    /// Replaces the whole structure in one command.
    ///
    /// When `expected_revision` is given and the stored menu has moved on, the
    /// command is refused with `ConcurrentModification`.
    pub async fn apply_structure(
        &self,
        storefront_id: Uuid,
        entries: Vec<StructureEntry>,
        expected_revision: Option<i64>,
    ) -> Result<NavigationUpdate, DomainError> {
        info!(
            "Structure update with {} entries in storefront {}",
            entries.len(),
            storefront_id
        );

        self.mutate(storefront_id, "structure", expected_revision, move |tree| {
            let changed = tree.apply_structure(&entries)?;
            Ok(Mutation::new((), changed))
        })
        .await
    }

    fn storefront_lock(&self, storefront_id: Uuid) -> Arc<Mutex<()>> {
        self.locks.entry(storefront_id).or_default().clone()
    }

    async fn mutate<T, F>(
        &self,
        storefront_id: Uuid,
        action: &'static str,
        expected_revision: Option<i64>,
        apply: F,
    ) -> Result<NavigationUpdate<T>, DomainError>
    where
        F: FnOnce(&mut NavigationTree) -> Result<Mutation<T>, DomainError> + Send,
        T: Send,
    {
        let lock = self.storefront_lock(storefront_id);
        let result = {
            let _guard = lock.lock().await;
            self.read_validate_write(storefront_id, action, expected_revision, apply)
                .await
        };
        drop(lock);
        self.locks
            .remove_if(&storefront_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn read_validate_write<T, F>(
        &self,
        storefront_id: Uuid,
        action: &'static str,
        expected_revision: Option<i64>,
        apply: F,
    ) -> Result<NavigationUpdate<T>, DomainError>
    where
        F: FnOnce(&mut NavigationTree) -> Result<Mutation<T>, DomainError> + Send,
        T: Send,
    {
        let snapshot = self.menu_repo.load_snapshot(&storefront_id).await?;
        if let Some(expected) = expected_revision {
            if expected != snapshot.revision {
                warn!(
                    "{} refused: storefront {} is at revision {}, client saw {}",
                    action, storefront_id, snapshot.revision, expected
                );
                return Err(DomainError::ConcurrentModification);
            }
        }

        let mut tree = NavigationTree::new(storefront_id, snapshot.items, self.max_depth);
        let mutation = apply(&mut tree).map_err(|e| {
            if let DomainError::Rejected(reason) = &e {
                warn!("{} rejected in storefront {}: {}", action, storefront_id, reason.code());
            }
            e
        })?;

        let changes = MenuChangeSet::collect(&tree, &mutation.changed, &mutation.deleted);
        let revision = if changes.is_empty() {
            debug!("{} in storefront {} changed nothing", action, storefront_id);
            snapshot.revision
        } else {
            let revision = self
                .menu_repo
                .commit(&storefront_id, snapshot.revision, &changes)
                .await?;
            info!(
                "{} committed {} row(s) in storefront {} (revision {})",
                action,
                changes.len(),
                storefront_id,
                revision
            );
            revision
        };

        Ok(NavigationUpdate {
            outcome: mutation.outcome,
            revision,
            changed: mutation.changed,
            deleted: mutation.deleted,
            tree: tree.build(),
        })
    }
}

fn current_item(tree: &NavigationTree, item_id: Uuid) -> Result<MenuItem, DomainError> {
    tree.get(item_id)
        .cloned()
        .ok_or(DomainError::MenuItemNotFound(item_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LinkType, MenuSnapshot};
    use crate::error::RejectionReason;
    use crate::repositories::MockMenuRepository;
    use chrono::Utc;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn storefront() -> Uuid {
        id(999)
    }

    fn item(n: u128, parent: Option<u128>, label: &str, sort_order: i32) -> MenuItem {
        MenuItem {
            id: id(n),
            storefront_id: storefront(),
            label: label.to_string(),
            link_type: LinkType::Page,
            target: label.to_lowercase(),
            parent_id: parent.map(id),
            sort_order,
            is_visible: true,
            show_dropdown: false,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    fn home_snapshot(revision: i64) -> MenuSnapshot {
        MenuSnapshot {
            storefront_id: storefront(),
            revision,
            items: vec![
                item(1, None, "Home", 0),
                item(2, Some(1), "Products", 0),
                item(3, Some(1), "About", 1),
            ],
        }
    }

    fn repo_with_snapshot(revision: i64) -> MockMenuRepository {
        let mut repo = MockMenuRepository::new();
        repo.expect_load_snapshot()
            .returning(move |_| Ok(home_snapshot(revision)));
        repo
    }

    #[tokio::test]
    async fn test_promote_commits_changed_rows() {
        let mut repo = repo_with_snapshot(4);
        repo.expect_commit()
            .times(1)
            .withf(|sf, rev, changes| {
                *sf == id(999)
                    && *rev == 4
                    && changes.upserts.len() == 1
                    && changes.upserts[0].id == id(3)
                    && changes.upserts[0].parent_id.is_none()
            })
            .returning(|_, rev, _| Ok(rev + 1));

        let service = NavigationService::new(Arc::new(repo), None);
        let update = service.promote(storefront(), id(3)).await.unwrap();

        assert_eq!(update.revision, 5);
        assert_eq!(update.changed, vec![id(3)]);
        assert_eq!(update.tree.len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_never_commits() {
        let mut repo = repo_with_snapshot(1);
        repo.expect_commit().never();

        let service = NavigationService::new(Arc::new(repo), None);
        let err = service
            .reparent(storefront(), id(1), Some(id(2)), None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Rejected(RejectionReason::Cycle)));
    }

    #[tokio::test]
    async fn test_noop_reports_success_without_commit() {
        let mut repo = repo_with_snapshot(7);
        repo.expect_commit().never();

        let service = NavigationService::new(Arc::new(repo), None);
        let update = service.promote(storefront(), id(1)).await.unwrap();

        assert_eq!(update.revision, 7);
        assert!(update.changed.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_modification_propagates() {
        let mut repo = repo_with_snapshot(2);
        repo.expect_commit()
            .times(1)
            .returning(|_, _, _| Err(DomainError::ConcurrentModification));

        let service = NavigationService::new(Arc::new(repo), None);
        let err = service
            .reorder(storefront(), vec![id(3), id(2)])
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ConcurrentModification));
    }

    #[tokio::test]
    async fn test_stale_structure_refused() {
        let mut repo = repo_with_snapshot(9);
        repo.expect_commit().never();

        let service = NavigationService::new(Arc::new(repo), None);
        let entries = vec![StructureEntry {
            id: id(1),
            parent_id: None,
            sort_order: 0,
        }];
        let err = service
            .apply_structure(storefront(), entries, Some(8))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ConcurrentModification));
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let mut repo = MockMenuRepository::new();
        repo.expect_load_snapshot()
            .returning(|_| Err(DomainError::DatabaseError("connection refused".to_string())));

        let service = NavigationService::new(Arc::new(repo), None);
        assert!(matches!(
            service.get_tree(storefront()).await,
            Err(DomainError::DatabaseError(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_writes_promoted_children_and_delete() {
        let mut repo = repo_with_snapshot(3);
        repo.expect_commit()
            .times(1)
            .withf(|_, _, changes| {
                let mut promoted: Vec<Uuid> = changes.upserts.iter().map(|i| i.id).collect();
                promoted.sort();
                changes.deletes == vec![id(1)] && promoted == vec![id(2), id(3)]
            })
            .returning(|_, rev, _| Ok(rev + 1));

        let service = NavigationService::new(Arc::new(repo), None);
        let update = service.delete_item(storefront(), id(1)).await.unwrap();

        assert_eq!(update.outcome.label, "Home");
        assert_eq!(update.deleted, vec![id(1)]);
        let roots: Vec<&str> = update.tree.iter().map(|n| n.item.label.as_str()).collect();
        assert_eq!(roots, vec!["Products", "About"]);
    }

    #[tokio::test]
    async fn test_create_validates_before_loading() {
        let mut repo = MockMenuRepository::new();
        repo.expect_load_snapshot().never();
        repo.expect_commit().never();

        let service = NavigationService::new(Arc::new(repo), None);
        let input = NewMenuItem {
            label: "X".to_string(),
            link_type: LinkType::Page,
            target: "x".to_string(),
            parent_id: None,
            is_visible: true,
            show_dropdown: false,
        };
        assert!(matches!(
            service.create_item(storefront(), input).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_under_parent() {
        let mut repo = repo_with_snapshot(0);
        repo.expect_commit()
            .times(1)
            .returning(|_, rev, _| Ok(rev + 1));

        let service = NavigationService::new(Arc::new(repo), Some(5));
        let input = NewMenuItem {
            label: "Contact".to_string(),
            link_type: LinkType::Section,
            target: "contact".to_string(),
            parent_id: Some(id(1)),
            is_visible: true,
            show_dropdown: false,
        };
        let update = service.create_item(storefront(), input).await.unwrap();

        assert_eq!(update.outcome.sort_order, 2);
        assert_eq!(update.revision, 1);
        assert_eq!(update.tree[0].children.len(), 3);
    }

    #[tokio::test]
    async fn test_lock_entries_released() {
        let mut repo = repo_with_snapshot(0);
        repo.expect_commit().returning(|_, rev, _| Ok(rev + 1));

        let service = NavigationService::new(Arc::new(repo), None);
        service.promote(storefront(), id(3)).await.unwrap();
        assert!(service.locks.is_empty());
    }
}
