//! In-process adapters for development and tests

pub mod menu_repo_impl;

pub use menu_repo_impl::InMemoryMenuRepository;
