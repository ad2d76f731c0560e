// ============================================================================
// Storefront Core - Menu Item Entity
// File: crates/storefront-core/src/domain/menu_item.rs
// Description: Storefront navigation entry with optional parent link
// ============================================================================

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use storefront_shared::types::{new_id, MenuItemId, StorefrontId};
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError, ValidationErrors};

static PAGE_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*(?:/[a-z0-9]+(?:-[a-z0-9]+)*)*$")
        .expect("page slug pattern is valid")
});

static SECTION_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("section anchor pattern is valid")
});

/// How a menu item's `target` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Page slug inside the storefront
    Page,
    /// Anchor id on the current page
    Section,
    /// Absolute http(s) URL
    External,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Page => "page",
            LinkType::Section => "section",
            LinkType::External => "external",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "page" => Some(LinkType::Page),
            "section" => Some(LinkType::Section),
            "external" => Some(LinkType::External),
            _ => None,
        }
    }

    /// Canonical form of a raw target for this link type.
    pub fn normalize_target(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            LinkType::Page => trimmed.trim_start_matches('/').to_string(),
            LinkType::Section => trimmed.strip_prefix('#').unwrap_or(trimmed).to_string(),
            LinkType::External => trimmed.to_string(),
        }
    }
}

impl Default for LinkType {
    fn default() -> Self {
        LinkType::Page
    }
}

/// Menu Item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_target"))]
pub struct MenuItem {
    pub id: MenuItemId,
    pub storefront_id: StorefrontId,

    #[validate(length(min = 2, max = 50, message = "Label must be between 2 and 50 characters"))]
    pub label: String,

    pub link_type: LinkType,

    #[validate(length(min = 1, max = 2048, message = "Target must be between 1 and 2048 characters"))]
    pub target: String,

    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_visible: bool,
    pub show_dropdown: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

fn validate_target(item: &MenuItem) -> Result<(), ValidationError> {
    let (valid, code, message) = match item.link_type {
        LinkType::Page => (
            PAGE_SLUG.is_match(&item.target),
            "page_slug",
            "Page target must be a lowercase slug such as `about` or `products/steel-pipes`",
        ),
        LinkType::Section => (
            SECTION_ANCHOR.is_match(&item.target),
            "section_anchor",
            "Section target must be an anchor id such as `contact-us`",
        ),
        LinkType::External => (
            item.target.validate_url()
                && (item.target.starts_with("http://") || item.target.starts_with("https://")),
            "external_url",
            "External target must be an absolute http or https URL",
        ),
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new(code).with_message(Cow::Borrowed(message)))
    }
}

/// Fields accepted when creating a menu item
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub label: String,
    pub link_type: LinkType,
    pub target: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub show_dropdown: bool,
}

fn default_true() -> bool {
    true
}

/// Partial edit of the non-structural fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemPatch {
    pub label: Option<String>,
    pub link_type: Option<LinkType>,
    pub target: Option<String>,
    pub is_visible: Option<bool>,
    pub show_dropdown: Option<bool>,
}

impl MenuItemPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.link_type.is_none()
            && self.target.is_none()
            && self.is_visible.is_none()
            && self.show_dropdown.is_none()
    }
}

impl MenuItem {
    pub fn new(storefront_id: StorefrontId, input: NewMenuItem) -> Result<Self, ValidationErrors> {
        let item = Self {
            id: new_id(),
            storefront_id,
            label: input.label.trim().to_string(),
            link_type: input.link_type,
            target: input.link_type.normalize_target(&input.target),
            parent_id: input.parent_id,
            sort_order: 0,
            is_visible: input.is_visible,
            show_dropdown: input.show_dropdown,
            created_at: Utc::now(),
            modified_at: None,
        };

        item.validate()?;
        Ok(item)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Applies the patch, returning whether anything changed.
    ///
    /// The item is left untouched when the patched result fails validation.
    pub fn apply_patch(&mut self, patch: &MenuItemPatch) -> Result<bool, ValidationErrors> {
        let mut next = self.clone();
        if let Some(label) = &patch.label {
            next.label = label.trim().to_string();
        }
        if let Some(link_type) = patch.link_type {
            next.link_type = link_type;
        }
        if let Some(target) = &patch.target {
            next.target = next.link_type.normalize_target(target);
        }
        if let Some(is_visible) = patch.is_visible {
            next.is_visible = is_visible;
        }
        if let Some(show_dropdown) = patch.show_dropdown {
            next.show_dropdown = show_dropdown;
        }

        if next == *self {
            return Ok(false);
        }

        next.validate()?;
        next.modified_at = Some(Utc::now());
        *self = next;
        Ok(true)
    }

    pub(crate) fn touch(&mut self) {
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(label: &str, link_type: LinkType, target: &str) -> NewMenuItem {
        NewMenuItem {
            label: label.to_string(),
            link_type,
            target: target.to_string(),
            parent_id: None,
            is_visible: true,
            show_dropdown: false,
        }
    }

    #[test]
    fn test_create_menu_item() {
        let item = MenuItem::new(Uuid::new_v4(), input("  Home  ", LinkType::Page, "/home"));
        let item = item.unwrap();
        assert!(item.is_root());
        assert_eq!(item.label, "Home");
        assert_eq!(item.target, "home");
        assert_eq!(item.sort_order, 0);
    }

    #[test]
    fn test_label_length_bounds() {
        let sf = Uuid::new_v4();
        assert!(MenuItem::new(sf, input("A", LinkType::Page, "home")).is_err());
        assert!(MenuItem::new(sf, input("Ab", LinkType::Page, "home")).is_ok());
        assert!(MenuItem::new(sf, input(&"x".repeat(50), LinkType::Page, "home")).is_ok());
        assert!(MenuItem::new(sf, input(&"x".repeat(51), LinkType::Page, "home")).is_err());
    }

    #[test]
    fn test_target_rules_per_link_type() {
        let sf = Uuid::new_v4();
        assert!(MenuItem::new(sf, input("Pipes", LinkType::Page, "products/steel-pipes")).is_ok());
        assert!(MenuItem::new(sf, input("Pipes", LinkType::Page, "Products Page")).is_err());

        let section = MenuItem::new(sf, input("Contact", LinkType::Section, "#contact-us")).unwrap();
        assert_eq!(section.target, "contact-us");
        assert!(MenuItem::new(sf, input("Contact", LinkType::Section, "#1bad")).is_err());

        assert!(MenuItem::new(sf, input("Docs", LinkType::External, "https://example.com/docs")).is_ok());
        assert!(MenuItem::new(sf, input("Docs", LinkType::External, "ftp://example.com")).is_err());
        assert!(MenuItem::new(sf, input("Docs", LinkType::External, "example.com")).is_err());
    }

    #[test]
    fn test_apply_patch() {
        let mut item = MenuItem::new(Uuid::new_v4(), input("About", LinkType::Page, "about")).unwrap();

        let unchanged = item.apply_patch(&MenuItemPatch {
            label: Some("About".to_string()),
            ..Default::default()
        });
        assert!(!unchanged.unwrap());
        assert!(item.modified_at.is_none());

        let changed = item.apply_patch(&MenuItemPatch {
            link_type: Some(LinkType::External),
            target: Some("https://example.com/about".to_string()),
            is_visible: Some(false),
            ..Default::default()
        });
        assert!(changed.unwrap());
        assert_eq!(item.link_type, LinkType::External);
        assert!(!item.is_visible);
        assert!(item.modified_at.is_some());
    }

    #[test]
    fn test_invalid_patch_leaves_item_untouched() {
        let mut item = MenuItem::new(Uuid::new_v4(), input("About", LinkType::Page, "about")).unwrap();
        let before = item.clone();

        // switching to an external link without a URL target
        let result = item.apply_patch(&MenuItemPatch {
            link_type: Some(LinkType::External),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn test_link_type_round_trip() {
        for lt in [LinkType::Page, LinkType::Section, LinkType::External] {
            assert_eq!(LinkType::from_str(lt.as_str()), Some(lt));
        }
        assert_eq!(LinkType::from_str("PAGE"), Some(LinkType::Page));
        assert_eq!(LinkType::from_str("anchor"), None);
    }
}
