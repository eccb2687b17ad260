//! Catalog Aggregate
//!
//! The domain objects activity entries and receipts refer to, their storage,
//! and the status hooks that run when versions or files go away.

pub mod entity;
pub mod lifecycle;
pub mod repository;

pub use entity::{
    Addon, AddonStatus, Collection, File, Group, Installed, Review, Tag, User, Version,
};
pub use lifecycle::CatalogService;
pub use repository::{CatalogResolver, CatalogStore, InMemoryCatalog};
