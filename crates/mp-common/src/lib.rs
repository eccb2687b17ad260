//! Marketplace Common
//!
//! Shared building blocks used by every marketplace crate:
//! - `logging` - tracing subscriber setup
//! - `html` - escaped HTML fragments for rendered activity

pub mod html;
pub mod logging;

pub use html::{escape, Markup};
