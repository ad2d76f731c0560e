//! Common types

use uuid::Uuid;

pub type StorefrontId = Uuid;
pub type MenuItemId = Uuid;

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}
