//! Request and response payloads

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use storefront_core::domain::{MenuItem, StructureEntry, TreeNode};
use storefront_core::services::{NavigationUpdate, NavigationView};

/// `POST .../items/{item_id}/move`
#[derive(Debug, Deserialize)]
pub struct MoveItemRequest {
    /// `null` or absent moves the item to the top level
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Slot among the new siblings; appended when absent
    #[serde(default)]
    pub position: Option<usize>,
}

/// `POST .../reorder`
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRequest {
    #[validate(length(min = 1, message = "At least one menu item id is required"))]
    pub item_ids: Vec<Uuid>,
}

/// `PUT .../structure`
#[derive(Debug, Deserialize)]
pub struct StructureRequest {
    pub entries: Vec<StructureEntry>,
    #[serde(default)]
    pub expected_revision: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MenuTreeResponse {
    pub storefront_id: Uuid,
    pub revision: i64,
    pub items: Vec<TreeNode>,
}

impl From<NavigationView> for MenuTreeResponse {
    fn from(view: NavigationView) -> Self {
        Self {
            storefront_id: view.storefront_id,
            revision: view.revision,
            items: view.tree,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MenuUpdateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<MenuItem>,
    pub revision: i64,
    pub changed: Vec<Uuid>,
    pub deleted: Vec<Uuid>,
    pub items: Vec<TreeNode>,
}

impl From<NavigationUpdate<MenuItem>> for MenuUpdateResponse {
    fn from(update: NavigationUpdate<MenuItem>) -> Self {
        Self {
            item: Some(update.outcome),
            revision: update.revision,
            changed: update.changed,
            deleted: update.deleted,
            items: update.tree,
        }
    }
}

impl From<NavigationUpdate> for MenuUpdateResponse {
    fn from(update: NavigationUpdate) -> Self {
        Self {
            item: None,
            revision: update.revision,
            changed: update.changed,
            deleted: update.deleted,
            items: update.tree,
        }
    }
}
