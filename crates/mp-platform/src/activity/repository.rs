//! Activity Log Repository

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::entity::{ActivityLog, CommentLog, IndexKind, LogIndex};
use crate::shared::error::{PlatformError, Result};

/// Criteria for [`ActivityLogRepository::search`]. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    /// Only entries indexed against one of these targets
    pub indexed_by: Option<(IndexKind, Vec<u64>)>,
    /// Only entries with at least one index row of this kind
    pub has_index: Option<IndexKind>,
    pub actions_in: Option<Vec<u16>>,
    pub actions_not_in: Vec<u16>,
    pub created_since: Option<DateTime<Utc>>,
    pub exclude_actor: Option<u64>,
    pub limit: Option<usize>,
}

impl ActivityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexed_by(mut self, kind: IndexKind, target_ids: impl Into<Vec<u64>>) -> Self {
        self.indexed_by = Some((kind, target_ids.into()));
        self
    }

    pub fn has_index(mut self, kind: IndexKind) -> Self {
        self.has_index = Some(kind);
        self
    }

    pub fn actions_in(mut self, actions: impl Into<Vec<u16>>) -> Self {
        self.actions_in = Some(actions.into());
        self
    }

    pub fn actions_not_in(mut self, actions: impl Into<Vec<u16>>) -> Self {
        self.actions_not_in = actions.into();
        self
    }

    pub fn created_since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }

    pub fn exclude_actor(mut self, actor_id: Option<u64>) -> Self {
        self.exclude_actor = actor_id;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Checks the columns of the entry itself. Index criteria are joined by the store.
    pub fn matches_entry(&self, log: &ActivityLog) -> bool {
        if let Some(actions) = &self.actions_in {
            if !actions.contains(&log.action) {
                return false;
            }
        }
        if self.actions_not_in.contains(&log.action) {
            return false;
        }
        if let Some(since) = self.created_since {
            if log.created < since {
                return false;
            }
        }
        if let (Some(excluded), Some(actor)) = (self.exclude_actor, log.actor_id) {
            if excluded == actor {
                return false;
            }
        }
        true
    }
}

/// Storage for activity entries and their index rows.
///
/// An entry, its index rows and its comment are written together: either all
/// of them are stored or none are.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Store a new entry, one index row per `(kind, target)` pair and an
    /// optional comment. Returns the entry with its assigned id.
    async fn insert_with_indexes(
        &self,
        log: ActivityLog,
        indexes: Vec<(IndexKind, u64)>,
        comments: Option<String>,
    ) -> Result<ActivityLog>;

    /// Store an entry with no index rows.
    async fn insert(&self, log: ActivityLog) -> Result<ActivityLog> {
        self.insert_with_indexes(log, Vec::new(), None).await
    }

    async fn update(&self, log: &ActivityLog) -> Result<()>;
    async fn find_by_id(&self, id: u64) -> Result<Option<ActivityLog>>;
    /// Matching entries, newest first.
    async fn search(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>>;
    async fn comments_for(&self, activity_log_id: u64) -> Result<Vec<CommentLog>>;

    /// Remove entries created before `cutoff` whose action is not in `keep`,
    /// along with their index rows and comments. Returns the number removed.
    async fn delete_before(&self, cutoff: DateTime<Utc>, keep: &[u16]) -> Result<usize>;
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    logs: BTreeMap<u64, ActivityLog>,
    indexes: Vec<LogIndex>,
    comments: Vec<CommentLog>,
}

impl MemoryState {
    fn select(&self, filter: &ActivityFilter) -> Vec<ActivityLog> {
        let indexed: Option<HashSet<u64>> = filter.indexed_by.as_ref().map(|(kind, targets)| {
            self.indexes
                .iter()
                .filter(|index| index.kind == *kind && targets.contains(&index.target_id))
                .map(|index| index.activity_log_id)
                .collect()
        });
        let with_kind: Option<HashSet<u64>> = filter.has_index.map(|kind| {
            self.indexes
                .iter()
                .filter(|index| index.kind == kind)
                .map(|index| index.activity_log_id)
                .collect()
        });

        let mut selected: Vec<ActivityLog> = self
            .logs
            .values()
            .filter(|log| indexed.as_ref().map_or(true, |ids| ids.contains(&log.id)))
            .filter(|log| with_kind.as_ref().map_or(true, |ids| ids.contains(&log.id)))
            .filter(|log| filter.matches_entry(log))
            .cloned()
            .collect();

        selected.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// In-memory store for tests and the dev tool
#[derive(Default)]
pub struct InMemoryActivityLogRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryActivityLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries.
    pub fn len(&self) -> usize {
        self.state.read().logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index rows pointing at one target.
    pub fn indexes_of(&self, kind: IndexKind, target_id: u64) -> Vec<LogIndex> {
        self.state
            .read()
            .indexes
            .iter()
            .filter(|index| index.kind == kind && index.target_id == target_id)
            .copied()
            .collect()
    }
}

#[async_trait]
impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn insert_with_indexes(
        &self,
        mut log: ActivityLog,
        indexes: Vec<(IndexKind, u64)>,
        comments: Option<String>,
    ) -> Result<ActivityLog> {
        let mut state = self.state.write();
        state.next_id += 1;
        log.id = state.next_id;
        state.logs.insert(log.id, log.clone());
        state.indexes.extend(
            indexes
                .into_iter()
                .map(|(kind, target_id)| LogIndex::new(kind, target_id, log.id)),
        );
        if let Some(comments) = comments {
            state.comments.push(CommentLog {
                activity_log_id: log.id,
                comments,
            });
        }
        Ok(log)
    }

    async fn update(&self, log: &ActivityLog) -> Result<()> {
        let mut state = self.state.write();
        match state.logs.get_mut(&log.id) {
            Some(stored) => {
                *stored = log.clone();
                Ok(())
            }
            None => Err(PlatformError::not_found("ActivityLog", log.id)),
        }
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<ActivityLog>> {
        Ok(self.state.read().logs.get(&id).cloned())
    }

    async fn search(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>> {
        Ok(self.state.read().select(filter))
    }


    async fn comments_for(&self, activity_log_id: u64) -> Result<Vec<CommentLog>> {
        Ok(self
            .state
            .read()
            .comments
            .iter()
            .filter(|comment| comment.activity_log_id == activity_log_id)
            .cloned()
            .collect())
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>, keep: &[u16]) -> Result<usize> {
        let mut state = self.state.write();
        let doomed: HashSet<u64> = state
            .logs
            .values()
            .filter(|log| log.created < cutoff && !keep.contains(&log.action))
            .map(|log| log.id)
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }
        state.logs.retain(|id, _| !doomed.contains(id));
        state.indexes.retain(|index| !doomed.contains(&index.activity_log_id));
        state.comments.retain(|comment| !doomed.contains(&comment.activity_log_id));
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::action::ActivityAction;
    use chrono::Duration;

    fn entry(action: ActivityAction, actor: u64) -> ActivityLog {
        ActivityLog::new(action, Some(actor))
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let repo = InMemoryActivityLogRepository::new();
        let first = repo.insert(entry(ActivityAction::CustomText, 1)).await.unwrap();
        let second = repo.insert(entry(ActivityAction::CustomText, 1)).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryActivityLogRepository::new();
        let mut log = entry(ActivityAction::CustomText, 1);
        log.id = 99;
        let err = repo.update(&log).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_search_newest_first_with_filters() {
        let repo = InMemoryActivityLogRepository::new();
        let now = Utc::now();
        repo.insert(entry(ActivityAction::CreateAddon, 1).with_created(now - Duration::days(2)))
            .await
            .unwrap();
        let recent = repo
            .insert(entry(ActivityAction::ApproveVersion, 2).with_created(now))
            .await
            .unwrap();
        repo.insert(entry(ActivityAction::ObjectEdited, 3).with_created(now - Duration::days(1)))
            .await
            .unwrap();

        let all = repo.search(&ActivityFilter::new()).await.unwrap();
        assert_eq!(all.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2, 3, 1]);

        let filter = ActivityFilter::new()
            .actions_not_in(vec![ActivityAction::ObjectEdited.id()])
            .created_since(now - Duration::hours(1));
        let found = repo.search(&filter).await.unwrap();
        assert_eq!(found, vec![recent]);

        let without_two = ActivityFilter::new().exclude_actor(Some(2));
        assert_eq!(repo.search(&without_two).await.unwrap().len(), 2);
        assert_eq!(repo.search(&ActivityFilter::new().limit(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_indexed_search() {
        let repo = InMemoryActivityLogRepository::new();
        let a = repo
            .insert_with_indexes(entry(ActivityAction::CreateAddon, 1), vec![(IndexKind::Addon, 10)], None)
            .await
            .unwrap();
        repo.insert_with_indexes(entry(ActivityAction::CreateAddon, 1), vec![(IndexKind::User, 1)], None)
            .await
            .unwrap();

        let for_addon = repo
            .search(&ActivityFilter::new().indexed_by(IndexKind::Addon, vec![10]))
            .await
            .unwrap();
        assert_eq!(for_addon, vec![a.clone()]);

        let with_addon = repo
            .search(&ActivityFilter::new().has_index(IndexKind::Addon))
            .await
            .unwrap();
        assert_eq!(with_addon, vec![a]);
        assert_eq!(repo.indexes_of(IndexKind::User, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_insert_writes_indexes_and_comment_together() {
        let repo = InMemoryActivityLogRepository::new();
        let log = repo
            .insert_with_indexes(
                entry(ActivityAction::RejectVersion, 4),
                vec![(IndexKind::Addon, 10), (IndexKind::User, 4)],
                Some("needs work".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(repo.indexes_of(IndexKind::Addon, 10), vec![LogIndex::new(IndexKind::Addon, 10, log.id)]);
        assert_eq!(repo.indexes_of(IndexKind::User, 4).len(), 1);
        let comments = repo.comments_for(log.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comments, "needs work");
    }

    #[tokio::test]
    async fn test_delete_before_spares_kept_and_recent() {
        let repo = InMemoryActivityLogRepository::new();
        let now = Utc::now();
        let old = repo
            .insert_with_indexes(
                entry(ActivityAction::CustomText, 1).with_created(now - Duration::days(90)),
                vec![(IndexKind::Addon, 10)],
                Some("old".to_string()),
            )
            .await
            .unwrap();
        let kept = repo
            .insert(entry(ActivityAction::CreateAddon, 1).with_created(now - Duration::days(90)))
            .await
            .unwrap();
        let recent = repo.insert(entry(ActivityAction::CustomText, 1)).await.unwrap();

        let removed = repo
            .delete_before(now - Duration::days(30), &[ActivityAction::CreateAddon.id()])
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(repo.find_by_id(old.id).await.unwrap().is_none());
        assert!(repo.find_by_id(kept.id).await.unwrap().is_some());
        assert!(repo.find_by_id(recent.id).await.unwrap().is_some());
        assert!(repo.indexes_of(IndexKind::Addon, 10).is_empty());
        assert!(repo.comments_for(old.id).await.unwrap().is_empty());
    }
}
