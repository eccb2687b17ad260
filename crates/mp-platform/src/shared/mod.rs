//! Shared infrastructure used by every aggregate.

pub mod acl;
pub mod context;
pub mod error;

pub use acl::{action_allowed, permissions};
pub use context::RequestContext;
pub use error::{PlatformError, Result};
