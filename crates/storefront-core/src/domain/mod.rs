//! # Storefront Core - Domain Module
//! 
//! Menu entities and the navigation tree algorithms.

pub mod menu_item;
pub mod tree;
pub mod navigation;
pub mod snapshot;

// Re-export all entities and enums
pub use menu_item::{LinkType, MenuItem, MenuItemPatch, NewMenuItem};
pub use tree::{build_tree, find_node, flatten, public_tree, TreeNode};
pub use navigation::{NavigationTree, Removal, StructureEntry};
pub use snapshot::{MenuChangeSet, MenuSnapshot};
