//! Activity Log Entity
//!
//! One row per tracked action, plus the index rows that let an entry be
//! found from the add-ons, versions, users and groups it mentions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::action::ActivityAction;
use super::argument::{decode_arguments, encode_arguments, LogArgument, ObjectKind};

/// Stored activity entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    /// Assigned by the repository on insert
    pub id: u64,

    /// Numeric action id, see [`ActivityAction::from_id`]
    pub action: u16,

    /// User who performed the action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<u64>,

    /// Encoded argument list
    pub raw_arguments: String,

    /// Free-form JSON details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_details: Option<String>,

    pub created: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(action: ActivityAction, actor_id: Option<u64>) -> Self {
        Self {
            id: 0,
            action: action.id(),
            actor_id,
            raw_arguments: encode_arguments(&[]),
            raw_details: None,
            created: Utc::now(),
        }
    }

    /// The action, or `None` for ids no longer in the table.
    pub fn action(&self) -> Option<ActivityAction> {
        ActivityAction::from_id(self.action)
    }

    /// Decoded arguments. Malformed storage yields `None`.
    pub fn arguments(&self) -> Option<Vec<LogArgument>> {
        let decoded = decode_arguments(&self.raw_arguments);
        if decoded.is_none() {
            debug!(
                activity_id = self.id,
                raw = %self.raw_arguments,
                "Could not decode activity arguments"
            );
        }
        decoded
    }

    pub fn set_arguments(&mut self, arguments: &[LogArgument]) {
        self.raw_arguments = encode_arguments(arguments);
    }

    pub fn with_arguments(mut self, arguments: &[LogArgument]) -> Self {
        self.set_arguments(arguments);
        self
    }

    /// Decoded details, `None` when absent or malformed.
    pub fn details(&self) -> Option<Value> {
        self.raw_details
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    pub fn set_details(&mut self, details: &Value) {
        self.raw_details = Some(details.to_string());
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Object references among the arguments, in argument order.
    pub fn references(&self, kind: ObjectKind) -> Vec<u64> {
        self.arguments()
            .unwrap_or_default()
            .iter()
            .filter_map(LogArgument::as_object)
            .filter(|reference| reference.kind == kind)
            .map(|reference| reference.id)
            .collect()
    }
}

/// Object kinds that get an index row when they appear as an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexKind {
    Addon,
    Version,
    User,
    Group,
}

impl IndexKind {
    pub fn for_object(kind: ObjectKind) -> Option<Self> {
        match kind {
            ObjectKind::Addon => Some(IndexKind::Addon),
            ObjectKind::Version => Some(IndexKind::Version),
            ObjectKind::User => Some(IndexKind::User),
            ObjectKind::Group => Some(IndexKind::Group),
            _ => None,
        }
    }
}

/// Links one activity entry to one add-on, version, user or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogIndex {
    pub kind: IndexKind,
    pub target_id: u64,
    pub activity_log_id: u64,
}

impl LogIndex {
    pub fn new(kind: IndexKind, target_id: u64, activity_log_id: u64) -> Self {
        Self {
            kind,
            target_id,
            activity_log_id,
        }
    }
}

/// Reviewer comments attached to an entry through its `comments` detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLog {
    pub activity_log_id: u64,
    pub comments: String,
}
