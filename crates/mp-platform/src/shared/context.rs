//! Request Context
//!
//! Carries the acting user and tracing ids through a single request.
//! Passed explicitly into every call that records activity.

use chrono::{DateTime, Utc};
use tracing::{info_span, Span};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique ID for this request
    pub request_id: String,
    /// User performing the request, `None` for anonymous requests
    pub actor_id: Option<u64>,
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Context for a request made by `actor_id`.
    pub fn for_actor(actor_id: u64) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            actor_id: Some(actor_id),
            started_at: Utc::now(),
        }
    }

    /// Context with no acting user. Activity logged under it is dropped.
    pub fn anonymous() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            actor_id: None,
            started_at: Utc::now(),
        }
    }

    /// Keep an upstream request id (e.g. from an `X-Request-Id` header).
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.actor_id.is_none()
    }

    /// Span carrying the request fields for nested log events.
    pub fn span(&self) -> Span {
        info_span!(
            "request",
            request_id = %self.request_id,
            actor_id = ?self.actor_id,
        )
    }
}
