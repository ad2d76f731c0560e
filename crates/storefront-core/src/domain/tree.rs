// ============================================================================
// Storefront Core - Navigation Tree Builder
// File: crates/storefront-core/src/domain/tree.rs
// Description: Flat menu rows to an ordered forest for rendering
// ============================================================================

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::menu_item::MenuItem;

/// A menu item with its ordered children
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub item: MenuItem,
    /// 1 for roots
    pub depth: usize,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> Uuid {
        self.item.id
    }

    pub fn child_ids(&self) -> Vec<Uuid> {
        self.children.iter().map(|c| c.item.id).collect()
    }

    /// Number of nodes in this subtree, itself included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Builds the ordered forest for one storefront.
///
/// Items whose parent is missing or unknown become roots. Roots and every
/// children list are ordered by `sort_order`, ties by input order. Every input
/// item appears exactly once: items stranded on a parent cycle are surfaced as
/// extra roots after the regular ones.
pub fn build_tree(items: &[MenuItem]) -> Vec<TreeNode> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        index.entry(item.id).or_insert(pos);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut roots = Vec::new();
    for (pos, item) in items.iter().enumerate() {
        match item.parent_id.and_then(|p| index.get(&p).copied()) {
            Some(parent) if parent != pos => children[parent].push(pos),
            _ => roots.push(pos),
        }
    }

    // sort_by is stable and positions were pushed in input order
    let by_sort_order = |a: &usize, b: &usize| items[*a].sort_order.cmp(&items[*b].sort_order);
    roots.sort_by(by_sort_order);
    for list in children.iter_mut() {
        list.sort_by(by_sort_order);
    }

    let mut visited = vec![false; items.len()];
    let mut forest: Vec<TreeNode> = roots
        .iter()
        .map(|&pos| assemble(pos, 1, items, &children, &mut visited))
        .collect();

    let mut stranded = Vec::new();
    for pos in 0..items.len() {
        if visited[pos] {
            continue;
        }
        let entry = cycle_entry(pos, items, &index, &visited);
        warn!(
            "Menu item {} sits on a parent cycle; rendering it as a root",
            items[entry].id
        );
        stranded.push(assemble(entry, 1, items, &children, &mut visited));
    }
    stranded.sort_by_key(|node| node.item.sort_order);
    forest.extend(stranded);

    forest
}

fn assemble(
    pos: usize,
    depth: usize,
    items: &[MenuItem],
    children: &[Vec<usize>],
    visited: &mut [bool],
) -> TreeNode {
    visited[pos] = true;
    let mut nodes = Vec::with_capacity(children[pos].len());
    for &child in &children[pos] {
        if !visited[child] {
            nodes.push(assemble(child, depth + 1, items, children, visited));
        }
    }
    TreeNode {
        item: items[pos].clone(),
        depth,
        children: nodes,
    }
}

/// Walks up from an unreached item to the cycle it hangs from and returns the
/// cycle member that comes first in input order.
fn cycle_entry(
    start: usize,
    items: &[MenuItem],
    index: &HashMap<Uuid, usize>,
    visited: &[bool],
) -> usize {
    let mut seen_at: HashMap<usize, usize> = HashMap::new();
    let mut path = Vec::new();
    let mut current = start;

    loop {
        if let Some(&at) = seen_at.get(&current) {
            return path[at..].iter().copied().min().unwrap_or(start);
        }
        seen_at.insert(current, path.len());
        path.push(current);

        match items[current].parent_id.and_then(|p| index.get(&p).copied()) {
            Some(parent) if !visited[parent] => current = parent,
            _ => return start,
        }
    }
}

/// Tree for storefront visitors: hidden items are dropped with their subtrees.
pub fn public_tree(items: &[MenuItem]) -> Vec<TreeNode> {
    prune_hidden(build_tree(items))
}

fn prune_hidden(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    nodes
        .into_iter()
        .filter(|node| node.item.is_visible)
        .map(|mut node| {
            node.children = prune_hidden(std::mem::take(&mut node.children));
            node
        })
        .collect()
}

/// Depth-first pre-order listing of the forest.
pub fn flatten(forest: &[TreeNode]) -> Vec<&TreeNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&TreeNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children.iter().rev());
    }
    out
}

/// Finds a node anywhere in the forest.
pub fn find_node(forest: &[TreeNode], id: Uuid) -> Option<&TreeNode> {
    flatten(forest).into_iter().find(|node| node.item.id == id)
}
