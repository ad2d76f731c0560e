//! # Storefront Core
//! 
//! Navigation menu entities, tree algorithms, repository ports, and services.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::{DomainError, RejectionReason};
