//! Reviewer Statistics
//!
//! Leaderboards of review-queue decisions per reviewer.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::service::ActivityService;
use crate::shared::error::{PlatformError, Result};

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerCount {
    pub user_id: u64,
    pub display_name: String,
    pub approval_count: usize,
}

/// First instant of the calendar month containing `now` (UTC).
pub fn start_of_month(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    now.date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc())
        .ok_or_else(|| PlatformError::internal(format!("no month start for {}", now)))
}

impl ActivityService {
    /// All-time review counts, highest first.
    pub async fn total_reviews(&self) -> Result<Vec<ReviewerCount>> {
        self.reviewer_counts(None).await
    }

    /// Review counts for the current calendar month.
    pub async fn monthly_reviews(&self) -> Result<Vec<ReviewerCount>> {
        self.monthly_reviews_at(Utc::now()).await
    }

    pub async fn monthly_reviews_at(&self, now: DateTime<Utc>) -> Result<Vec<ReviewerCount>> {
        self.reviewer_counts(Some(start_of_month(now)?)).await
    }

    /// 1-based rank on the all-time board.
    pub async fn total_reviews_user_position(&self, user_id: u64) -> Result<Option<usize>> {
        Ok(position_of(&self.total_reviews().await?, user_id))
    }

    /// 1-based rank on this month's board.
    pub async fn monthly_reviews_user_position(&self, user_id: u64) -> Result<Option<usize>> {
        Ok(position_of(&self.monthly_reviews().await?, user_id))
    }

    async fn reviewer_counts(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ReviewerCount>> {
        let mut filter = self.review_queue_filter();
        filter.created_since = since;
        let entries = self.repo.search(&filter).await?;

        let mut counts: HashMap<u64, usize> = HashMap::new();
        for actor_id in entries.iter().filter_map(|entry| entry.actor_id) {
            *counts.entry(actor_id).or_default() += 1;
        }

        let mut ranked: Vec<(u64, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut rows = Vec::with_capacity(ranked.len());
        for (user_id, approval_count) in ranked {
            let display_name = match self.find_user(user_id).await? {
                Some(user) => user.name().to_string(),
                None => user_id.to_string(),
            };
            rows.push(ReviewerCount {
                user_id,
                display_name,
                approval_count,
            });
        }
        Ok(rows)
    }
}

fn position_of(rows: &[ReviewerCount], user_id: u64) -> Option<usize> {
    rows.iter()
        .position(|row| row.user_id == user_id)
        .map(|index| index + 1)
}
