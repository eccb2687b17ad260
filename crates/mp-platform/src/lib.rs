//! Marketplace Platform
//!
//! Core platform providing:
//! - Activity logging of user actions against catalog objects
//! - HTML rendering of activity history and reviewer leaderboards
//! - Add-on status recomputation when versions or files are deleted
//! - Signed purchase receipts for installed apps
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `service` - Operations on the aggregate

// Aggregates
pub mod activity;
pub mod catalog;
pub mod receipt;

// Shared infrastructure
pub mod shared;

pub use activity::{
    ActivityAction, ActivityLog, ActivityLogRepository, ActivityService, InMemoryActivityLogRepository,
    LogArgument, LogOptions, ObjectKind,
};
pub use catalog::{
    Addon, AddonStatus, CatalogResolver, CatalogService, CatalogStore, InMemoryCatalog, User,
};
pub use receipt::{LocalSigner, Receipt, ReceiptFlavour, ReceiptService, ReceiptSigner};
pub use shared::{PlatformError, RequestContext, Result};
