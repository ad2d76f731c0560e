//! Domain services (business logic)

pub mod navigation_service;

pub use navigation_service::{NavigationService, NavigationUpdate, NavigationView};
