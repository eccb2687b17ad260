//! Activity Service
//!
//! Records activity entries with their index rows, and answers the history
//! queries used by add-on pages, user profiles and the reviewer tools.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mp_common::Markup;
use mp_config::{ActivityConfig, SiteConfig};
use serde_json::Value;
use tracing::{debug, info, warn, Instrument};

use super::action::{ActionFlags, ActivityAction};
use super::argument::{LogArgument, ObjectKind, ObjectRef};
use super::entity::{ActivityLog, CommentLog, IndexKind};
use super::render::ActivityRenderer;
use super::repository::{ActivityFilter, ActivityLogRepository};
use super::resolver::{LogObject, ObjectResolver, ResolvedArgument};
use crate::catalog::User;
use crate::shared::context::RequestContext;
use crate::shared::error::Result;

/// Detail key whose value is copied into a [`CommentLog`].
pub const COMMENTS_DETAIL: &str = "comments";

/// Per-call overrides for [`ActivityService::log_with`].
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Record under this user instead of the context's actor
    pub actor_id: Option<u64>,
    pub details: Option<Value>,
    /// Backdate the entry
    pub created: Option<DateTime<Utc>>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(mut self, actor_id: u64) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

/// Activity log service
#[derive(Clone)]
pub struct ActivityService {
    pub(super) repo: Arc<dyn ActivityLogRepository>,
    pub(super) resolver: Arc<dyn ObjectResolver>,
    renderer: ActivityRenderer,
    pub(super) task_user_id: Option<u64>,
}

impl ActivityService {
    pub fn new(
        repo: Arc<dyn ActivityLogRepository>,
        resolver: Arc<dyn ObjectResolver>,
        site: &SiteConfig,
        activity: &ActivityConfig,
    ) -> Self {
        Self {
            repo,
            resolver,
            renderer: ActivityRenderer::new(site),
            task_user_id: activity.task_user_id,
        }
    }

    pub fn renderer(&self) -> &ActivityRenderer {
        &self.renderer
    }

    /// Record `action` by the context's actor. Without an actor nothing is stored.
    pub async fn log(
        &self,
        ctx: &RequestContext,
        action: ActivityAction,
        arguments: Vec<LogArgument>,
    ) -> Result<Option<ActivityLog>> {
        self.log_with(ctx, action, arguments, LogOptions::default()).await
    }

    pub async fn log_with(
        &self,
        ctx: &RequestContext,
        action: ActivityAction,
        arguments: Vec<LogArgument>,
        options: LogOptions,
    ) -> Result<Option<ActivityLog>> {
        self.record(ctx, action, arguments, options)
            .instrument(ctx.span())
            .await
    }

    async fn record(
        &self,
        ctx: &RequestContext,
        action: ActivityAction,
        arguments: Vec<LogArgument>,
        options: LogOptions,
    ) -> Result<Option<ActivityLog>> {
        let Some(actor_id) = options.actor_id.or(ctx.actor_id) else {
            warn!(action = %action, "Activity logged without an actor, skipping");
            return Ok(None);
        };

        let mut entry = ActivityLog::new(action, Some(actor_id)).with_arguments(&arguments);
        if let Some(details) = &options.details {
            entry.set_details(details);
        }
        if let Some(created) = options.created {
            entry = entry.with_created(created);
        }

        let mut targets: Vec<ObjectRef> = arguments.iter().filter_map(LogArgument::as_object).collect();
        targets.push(ObjectRef::new(ObjectKind::User, actor_id));

        let mut seen = HashSet::new();
        let indexes: Vec<(IndexKind, u64)> = targets
            .into_iter()
            .filter_map(|target| IndexKind::for_object(target.kind).map(|kind| (kind, target.id)))
            .filter(|pair| seen.insert(*pair))
            .collect();
        let indexed = indexes.len();

        let comments = options
            .details
            .as_ref()
            .and_then(|details| details.get(COMMENTS_DETAIL))
            .and_then(Value::as_str)
            .map(str::to_string);

        let entry = self.repo.insert_with_indexes(entry, indexes, comments).await?;

        info!(
            activity_id = entry.id,
            action = %action,
            actor_id,
            indexed,
            "Activity recorded"
        );
        Ok(Some(entry))
    }

    pub async fn find(&self, id: u64) -> Result<Option<ActivityLog>> {
        self.repo.find_by_id(id).await
    }

    /// Comments recorded for an entry.
    pub async fn comments(&self, activity_log_id: u64) -> Result<Vec<CommentLog>> {
        self.repo.comments_for(activity_log_id).await
    }

    pub async fn for_addons(&self, addon_ids: &[u64]) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(&ActivityFilter::new().indexed_by(IndexKind::Addon, addon_ids))
            .await
    }

    pub async fn for_version(&self, version_id: u64) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(&ActivityFilter::new().indexed_by(IndexKind::Version, vec![version_id]))
            .await
    }

    /// Entries grouped by the versions they mention. Every requested id has a key.
    pub async fn for_versions(&self, version_ids: &[u64]) -> Result<HashMap<u64, Vec<ActivityLog>>> {
        let entries = self
            .repo
            .search(&ActivityFilter::new().indexed_by(IndexKind::Version, version_ids))
            .await?;

        let mut grouped: HashMap<u64, Vec<ActivityLog>> =
            version_ids.iter().map(|id| (*id, Vec::new())).collect();
        for entry in entries {
            for version_id in entry.references(ObjectKind::Version) {
                if let Some(list) = grouped.get_mut(&version_id) {
                    if !list.iter().any(|existing| existing.id == entry.id) {
                        list.push(entry.clone());
                    }
                }
            }
        }
        Ok(grouped)
    }

    pub async fn for_user(&self, user_id: u64) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(&ActivityFilter::new().indexed_by(IndexKind::User, vec![user_id]))
            .await
    }

    pub async fn for_group(&self, group_id: u64) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(&ActivityFilter::new().indexed_by(IndexKind::Group, vec![group_id]))
            .await
    }

    pub async fn admin_events(&self) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(&ActivityFilter::new().actions_in(ActivityAction::ids_with(ActionFlags::ADMIN_EVENT)))
            .await
    }

    /// Add-on history as shown to its developers.
    pub async fn for_developer(&self, addon_ids: &[u64]) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(&Self::developer_filter().indexed_by(IndexKind::Addon, addon_ids))
            .await
    }

    /// Every entry a developer may see, whatever it is indexed against.
    pub async fn developer_events(&self) -> Result<Vec<ActivityLog>> {
        self.repo.search(&Self::developer_filter()).await
    }

    fn developer_filter() -> ActivityFilter {
        let mut hidden = ActivityAction::ids_with(ActionFlags::ADMIN_EVENT);
        hidden.extend(ActivityAction::ids_with(ActionFlags::HIDE_DEVELOPER));
        ActivityFilter::new().actions_not_in(hidden)
    }

    /// Review outcomes on these add-ons that are mailed to their developers.
    pub async fn review_notices(&self, addon_ids: &[u64]) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(
                &ActivityFilter::new()
                    .indexed_by(IndexKind::Addon, addon_ids)
                    .actions_in(ActivityAction::ids_with(ActionFlags::REVIEW_EMAIL_USER)),
            )
            .await
    }

    /// Delete entries older than `cutoff`, except actions flagged to be kept.
    pub async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let removed = self
            .repo
            .delete_before(cutoff, &ActivityAction::ids_with(ActionFlags::KEEP))
            .await?;
        info!(removed, cutoff = %cutoff, "Pruned activity log");
        Ok(removed)
    }

    pub async fn editor_events(&self) -> Result<Vec<ActivityLog>> {
        self.repo
            .search(&ActivityFilter::new().actions_in(ActivityAction::ids_with(ActionFlags::EDITOR_EVENT)))
            .await
    }

    /// Review decisions on add-ons, without the task user's automated ones.
    pub async fn review_queue(&self) -> Result<Vec<ActivityLog>> {
        self.repo.search(&self.review_queue_filter()).await
    }

    pub(super) fn review_queue_filter(&self) -> ActivityFilter {
        ActivityFilter::new()
            .actions_in(ActivityAction::ids_with(ActionFlags::REVIEW_QUEUE))
            .has_index(IndexKind::Addon)
            .exclude_actor(self.task_user_id)
    }

    /// Look up each stored reference. `None` when the stored list is malformed.
    pub async fn resolve_arguments(&self, entry: &ActivityLog) -> Result<Option<Vec<ResolvedArgument>>> {
        match entry.arguments() {
            Some(arguments) => Ok(Some(self.resolver.resolve_all(&arguments).await?)),
            None => Ok(None),
        }
    }

    pub(super) async fn find_user(&self, user_id: u64) -> Result<Option<User>> {
        match self.resolver.resolve(ObjectRef::new(ObjectKind::User, user_id)).await? {
            Some(LogObject::User(user)) => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    /// HTML sentence describing the entry.
    pub async fn render(&self, entry: &ActivityLog) -> Result<Markup> {
        let arguments = self.resolve_arguments(entry).await?;
        let actor = match entry.actor_id {
            Some(actor_id) => self.find_user(actor_id).await?,
            None => None,
        };
        debug!(activity_id = entry.id, "Rendering activity entry");
        Ok(self.renderer.render(entry, arguments.as_deref(), actor.as_ref()))
    }
}
