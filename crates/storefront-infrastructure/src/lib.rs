//! # Storefront Infrastructure
//! 
//! Menu repository implementations (adapters).

pub mod database;
pub mod memory;

pub use database::{create_pool, run_migrations, PgMenuRepository};
pub use memory::InMemoryMenuRepository;
