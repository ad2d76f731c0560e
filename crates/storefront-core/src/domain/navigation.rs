// ============================================================================
// Storefront Core - Navigation Forest
// File: crates/storefront-core/src/domain/navigation.rs
// Description: Validated structural mutations over one storefront's menu
// ============================================================================

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use uuid::Uuid;

use super::menu_item::{MenuItem, MenuItemPatch};
use super::tree::{build_tree, public_tree, TreeNode};
use crate::error::{DomainError, RejectionReason};

/// One row of a "set new structure" command
#[derive(Debug, Clone, Deserialize)]
pub struct StructureEntry {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

/// Result of removing an item
#[derive(Debug, Clone)]
pub struct Removal {
    pub removed: MenuItem,
    /// Promoted children and renumbered siblings
    pub changed: Vec<Uuid>,
}

/// Arena of a storefront's menu items indexed by id.
///
/// Every mutation validates before touching anything, so a rejected request
/// leaves the arena unchanged. Successful mutations return the ids of the rows
/// that must be written back.
#[derive(Debug, Clone)]
pub struct NavigationTree {
    storefront_id: Uuid,
    items: Vec<MenuItem>,
    index: HashMap<Uuid, usize>,
    max_depth: Option<usize>,
}

impl NavigationTree {
    pub fn new(storefront_id: Uuid, items: Vec<MenuItem>, max_depth: Option<usize>) -> Self {
        let mut tree = Self {
            storefront_id,
            items,
            index: HashMap::new(),
            max_depth,
        };
        tree.reindex();
        tree
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, item) in self.items.iter().enumerate() {
            self.index.entry(item.id).or_insert(pos);
        }
    }

    pub fn storefront_id(&self) -> Uuid {
        self.storefront_id
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<MenuItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&MenuItem> {
        self.index.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn build(&self) -> Vec<TreeNode> {
        build_tree(&self.items)
    }

    pub fn build_public(&self) -> Vec<TreeNode> {
        public_tree(&self.items)
    }

    fn position(&self, id: Uuid) -> Result<usize, DomainError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(DomainError::MenuItemNotFound(id))
    }

    /// Parent as rendered: unknown or self references count as top level.
    fn effective_parent(&self, pos: usize) -> Option<usize> {
        self.items[pos]
            .parent_id
            .and_then(|p| self.index.get(&p).copied())
            .filter(|&parent| parent != pos)
    }

    /// Sibling group of `parent` in display order.
    fn sibling_group(&self, parent: Option<usize>) -> Vec<usize> {
        let mut group: Vec<usize> = (0..self.items.len())
            .filter(|&pos| self.effective_parent(pos) == parent)
            .collect();
        group.sort_by_key(|&pos| self.items[pos].sort_order);
        group
    }

    /// True when `candidate` is `ancestor` or lies below it.
    ///
    /// Walks parent links upward from `candidate`. The walk is bounded by the
    /// item count so it terminates on malformed cyclic data.
    pub fn is_ancestor_or_self(&self, ancestor: Uuid, candidate: Uuid) -> bool {
        let Some(mut current) = self.index.get(&candidate).copied() else {
            return false;
        };
        for _ in 0..=self.items.len() {
            if self.items[current].id == ancestor {
                return true;
            }
            match self.effective_parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Level of `pos`, roots being 1.
    fn depth_of(&self, pos: usize) -> usize {
        let mut depth = 1;
        let mut current = pos;
        while let Some(parent) = self.effective_parent(current) {
            depth += 1;
            current = parent;
            if depth > self.items.len() {
                break;
            }
        }
        depth
    }

    /// Levels spanned by the subtree rooted at `pos`, a leaf being 1.
    fn subtree_height(&self, pos: usize) -> usize {
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for child in 0..self.items.len() {
            if let Some(parent) = self.effective_parent(child) {
                children.entry(parent).or_default().push(child);
            }
        }

        let mut height = 0;
        let mut seen = HashSet::new();
        let mut stack = vec![(pos, 1)];
        while let Some((current, level)) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            height = height.max(level);
            if let Some(kids) = children.get(&current) {
                stack.extend(kids.iter().map(|&kid| (kid, level + 1)));
            }
        }
        height
    }

    fn check_depth(&self, levels: usize) -> Result<(), RejectionReason> {
        match self.max_depth {
            Some(max_depth) if levels > max_depth => {
                Err(RejectionReason::DepthExceeded { max_depth })
            }
            _ => Ok(()),
        }
    }

    /// Assigns `0..n-1` along `order`, recording the rows that moved.
    fn renumber(&mut self, order: &[usize], changed: &mut Vec<Uuid>) {
        for (slot, &pos) in order.iter().enumerate() {
            let slot = slot as i32;
            if self.items[pos].sort_order != slot {
                self.items[pos].sort_order = slot;
                self.items[pos].touch();
                mark(changed, self.items[pos].id);
            }
        }
    }

    /// Adds a new item at the end of its sibling group.
    pub fn insert(&mut self, mut item: MenuItem) -> Result<Vec<Uuid>, DomainError> {
        if self.index.contains_key(&item.id) {
            return Err(RejectionReason::DuplicateItem(item.id).into());
        }

        let parent = match item.parent_id {
            Some(parent_id) if parent_id == item.id => {
                return Err(RejectionReason::SelfParent.into());
            }
            Some(parent_id) => {
                let parent = self
                    .index
                    .get(&parent_id)
                    .copied()
                    .ok_or(RejectionReason::UnknownTarget)?;
                self.check_depth(self.depth_of(parent) + 1)?;
                Some(parent)
            }
            None => None,
        };

        item.storefront_id = self.storefront_id;
        item.sort_order = self.next_sort_order(parent, None);
        let id = item.id;
        self.items.push(item);
        self.index.insert(id, self.items.len() - 1);
        Ok(vec![id])
    }

    fn next_sort_order(&self, parent: Option<usize>, exclude: Option<usize>) -> i32 {
        self.sibling_group(parent)
            .into_iter()
            .filter(|&pos| Some(pos) != exclude)
            .map(|pos| self.items[pos].sort_order)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    /// Edits label, link, and visibility fields.
    pub fn edit(&mut self, id: Uuid, patch: &MenuItemPatch) -> Result<Vec<Uuid>, DomainError> {
        let pos = self.position(id)?;
        if self.items[pos].apply_patch(patch)? {
            Ok(vec![id])
        } else {
            Ok(Vec::new())
        }
    }

    /// Moves `node_id` (with its whole subtree) under `new_parent_id`.
    ///
    /// Checks run in order: self-parent, cycle, unknown target, depth. Without
    /// a `position` the node is appended after its new siblings; with one it is
    /// inserted at that index and the group is renumbered.
    pub fn reparent(
        &mut self,
        node_id: Uuid,
        new_parent_id: Option<Uuid>,
        position: Option<usize>,
    ) -> Result<Vec<Uuid>, DomainError> {
        let pos = self.position(node_id)?;

        if new_parent_id == Some(node_id) {
            return Err(RejectionReason::SelfParent.into());
        }
        let new_parent = match new_parent_id {
            Some(target) => {
                if self.is_ancestor_or_self(node_id, target) {
                    return Err(RejectionReason::Cycle.into());
                }
                Some(
                    self.index
                        .get(&target)
                        .copied()
                        .ok_or(RejectionReason::UnknownTarget)?,
                )
            }
            None => None,
        };

        let old_parent = self.effective_parent(pos);
        let group_changed = old_parent != new_parent;
        let link_changed = self.items[pos].parent_id != new_parent_id;
        if !link_changed && position.is_none() {
            return Ok(Vec::new());
        }

        if group_changed {
            let parent_depth = new_parent.map_or(0, |parent| self.depth_of(parent));
            self.check_depth(parent_depth + self.subtree_height(pos))?;
        }

        let mut changed = Vec::new();
        let old_siblings: Vec<usize> = self
            .sibling_group(old_parent)
            .into_iter()
            .filter(|&p| p != pos)
            .collect();

        if link_changed {
            self.items[pos].parent_id = new_parent_id;
            self.items[pos].touch();
            mark(&mut changed, node_id);
        }

        if group_changed {
            self.renumber(&old_siblings, &mut changed);
        }

        match position {
            Some(index) => {
                let mut siblings: Vec<usize> = self
                    .sibling_group(new_parent)
                    .into_iter()
                    .filter(|&p| p != pos)
                    .collect();
                siblings.insert(index.min(siblings.len()), pos);
                self.renumber(&siblings, &mut changed);
            }
            None if group_changed => {
                let next = self.next_sort_order(new_parent, Some(pos));
                if self.items[pos].sort_order != next {
                    self.items[pos].sort_order = next;
                    self.items[pos].touch();
                    mark(&mut changed, node_id);
                }
            }
            None => {}
        }

        Ok(changed)
    }

    /// Makes `node_id` a top-level item; a no-op when it already is one.
    pub fn promote(&mut self, node_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        self.reparent(node_id, None, None)
    }

    /// Orders a sibling group as listed.
    ///
    /// Listed items take `0..k-1`; siblings that were not listed follow in their
    /// current order. Membership never changes.
    pub fn reorder(&mut self, sibling_ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        if sibling_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut listed = Vec::with_capacity(sibling_ids.len());
        let mut seen = HashSet::new();
        for &id in sibling_ids {
            let pos = self
                .index
                .get(&id)
                .copied()
                .ok_or(RejectionReason::UnknownItem(id))?;
            if !seen.insert(pos) {
                return Err(RejectionReason::DuplicateItem(id).into());
            }
            listed.push(pos);
        }

        let parent = self.effective_parent(listed[0]);
        if listed.iter().any(|&pos| self.effective_parent(pos) != parent) {
            return Err(RejectionReason::MixedParents.into());
        }

        let mut order = listed;
        order.extend(
            self.sibling_group(parent)
                .into_iter()
                .filter(|pos| !seen.contains(pos)),
        );

        let mut changed = Vec::new();
        self.renumber(&order, &mut changed);
        Ok(changed)
    }

    /// Deletes an item; its children move up to the deleted item's parent and
    /// take its slot, keeping their relative order.
    ///
    /// On cyclic stored data the former parent can sit below a child. Such a
    /// child becomes a top-level item instead, appended after the roots.
    pub fn remove(&mut self, id: Uuid) -> Result<Removal, DomainError> {
        let pos = self.position(id)?;
        let parent = self.effective_parent(pos);
        let parent_id = parent.map(|p| self.items[p].id);

        let (attached, detached): (Vec<usize>, Vec<usize>) = self
            .sibling_group(Some(pos))
            .into_iter()
            .partition(|&child| match parent_id {
                Some(target) => !self.is_ancestor_or_self(self.items[child].id, target),
                None => true,
            });
        let first_free_root = self.next_sort_order(None, None);

        let mut changed = Vec::new();
        for &child in &attached {
            self.items[child].parent_id = parent_id;
            self.items[child].touch();
            mark(&mut changed, self.items[child].id);
        }
        for (offset, &child) in detached.iter().enumerate() {
            self.items[child].parent_id = None;
            self.items[child].sort_order = first_free_root.saturating_add(offset as i32);
            self.items[child].touch();
            mark(&mut changed, self.items[child].id);
        }

        let mut order = Vec::new();
        for sibling in self.sibling_group(parent) {
            if sibling == pos {
                order.extend(attached.iter().copied());
            } else if !attached.contains(&sibling) && !detached.contains(&sibling) {
                order.push(sibling);
            }
        }
        self.renumber(&order, &mut changed);

        let removed = self.items.remove(pos);
        self.reindex();
        changed.retain(|changed_id| *changed_id != id);

        Ok(Removal { removed, changed })
    }

    /// Replaces the whole structure in one validated step.
    ///
    /// `entries` must cover every item exactly once. Each sibling group is
    /// renumbered `0..n-1` following the given sort orders (ties by entry
    /// order), so applying the same command twice changes nothing the second
    /// time.
    pub fn apply_structure(&mut self, entries: &[StructureEntry]) -> Result<Vec<Uuid>, DomainError> {
        let mut proposed: HashMap<Uuid, Option<Uuid>> = HashMap::with_capacity(entries.len());
        for entry in entries {
            if !self.index.contains_key(&entry.id) {
                return Err(RejectionReason::UnknownItem(entry.id).into());
            }
            if proposed.insert(entry.id, entry.parent_id).is_some() {
                return Err(RejectionReason::DuplicateItem(entry.id).into());
            }
        }
        if let Some(missing) = self.items.iter().find(|item| !proposed.contains_key(&item.id)) {
            return Err(RejectionReason::MissingItem(missing.id).into());
        }

        for entry in entries {
            match entry.parent_id {
                Some(parent) if parent == entry.id => {
                    return Err(RejectionReason::SelfParent.into());
                }
                Some(parent) if !self.index.contains_key(&parent) => {
                    return Err(RejectionReason::UnknownTarget.into());
                }
                _ => {}
            }
        }

        for entry in entries {
            let mut depth = 1;
            let mut current = entry.parent_id;
            while let Some(parent) = current {
                if parent == entry.id || depth > self.items.len() {
                    return Err(RejectionReason::Cycle.into());
                }
                depth += 1;
                current = proposed.get(&parent).copied().flatten();
            }
            self.check_depth(depth)?;
        }

        let mut changed = Vec::new();
        let mut group_keys: Vec<Option<Uuid>> = Vec::new();
        let mut groups: HashMap<Option<Uuid>, Vec<(i32, usize)>> = HashMap::new();
        for entry in entries {
            let pos = self.index[&entry.id];
            if self.items[pos].parent_id != entry.parent_id {
                self.items[pos].parent_id = entry.parent_id;
                self.items[pos].touch();
                mark(&mut changed, entry.id);
            }
            if !groups.contains_key(&entry.parent_id) {
                group_keys.push(entry.parent_id);
            }
            groups
                .entry(entry.parent_id)
                .or_default()
                .push((entry.sort_order, pos));
        }

        for key in group_keys {
            let mut group = groups.remove(&key).unwrap_or_default();
            group.sort_by_key(|(sort_order, _)| *sort_order);
            let order: Vec<usize> = group.into_iter().map(|(_, pos)| pos).collect();
            self.renumber(&order, &mut changed);
        }

        Ok(changed)
    }
}

fn mark(changed: &mut Vec<Uuid>, id: Uuid) {
    if !changed.contains(&id) {
        changed.push(id);
    }
}
