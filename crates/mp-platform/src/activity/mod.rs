//! Activity Aggregate
//!
//! Records what users did to which catalog objects and renders the history
//! as HTML sentences.

pub mod action;
pub mod argument;
pub mod entity;
pub mod render;
pub mod repository;
pub mod resolver;
pub mod service;
pub mod stats;
pub mod template;

pub use action::{validate_registry, ActionFlags, ActivityAction};
pub use argument::{LogArgument, Loggable, ObjectKind, ObjectRef};
pub use entity::{ActivityLog, CommentLog, IndexKind, LogIndex};
pub use render::{ActivityRenderer, FALLBACK_MESSAGE};
pub use repository::{ActivityFilter, ActivityLogRepository, InMemoryActivityLogRepository};
pub use resolver::{LogObject, ObjectResolver, ResolvedArgument};
pub use service::{ActivityService, LogOptions};
pub use stats::ReviewerCount;
