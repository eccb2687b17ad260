//! Catalog Lifecycle
//!
//! Version and file deletion, and the add-on status recomputation that
//! follows them.

use std::sync::Arc;

use tracing::{info, Instrument};

use super::entity::{Addon, AddonStatus};
use super::repository::CatalogStore;
use crate::activity::{ActivityAction, ActivityService, LogArgument};
use crate::shared::context::RequestContext;
use crate::shared::error::{PlatformError, Result};

/// Catalog mutations that keep add-on status consistent
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    activity: Arc<ActivityService>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, activity: Arc<ActivityService>) -> Self {
        Self { store, activity }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Delete a version and its files, then recompute the add-on's status.
    pub async fn delete_version(&self, ctx: &RequestContext, version_id: u64) -> Result<AddonStatus> {
        async {
            let version = self.store.delete_version(version_id).await?;
            let addon = self.require_addon(version.addon_id).await?;

            self.activity
                .log(
                    ctx,
                    ActivityAction::DeleteVersion,
                    vec![LogArgument::from(&addon), LogArgument::text(version.version.clone())],
                )
                .await?;
            info!(version_id, addon_id = addon.id, version = %version.version, "Version deleted");

            self.update_status(ctx, addon.id).await
        }
        .instrument(ctx.span())
        .await
    }

    /// Delete a single file, then recompute the add-on's status.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: u64) -> Result<AddonStatus> {
        let file = self
            .store
            .find_file(file_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("File", file_id))?;
        let version = self
            .store
            .find_version(file.version_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Version", file.version_id))?;

        self.store.delete_file(file_id).await?;
        info!(file_id, version_id = version.id, "File deleted");

        self.update_status(ctx, version.addon_id).await
    }

    /// Recompute status from the remaining versions and files.
    pub async fn update_status(&self, ctx: &RequestContext, addon_id: u64) -> Result<AddonStatus> {
        let mut addon = self.require_addon(addon_id).await?;
        if addon.status == AddonStatus::Null || addon.is_disabled() {
            return Ok(addon.status);
        }

        let versions = self.store.versions_for_addon(addon_id).await?;
        let mut file_statuses = Vec::new();
        for version in &versions {
            file_statuses.extend(
                self.store
                    .files_for_version(version.id)
                    .await?
                    .into_iter()
                    .map(|file| file.status),
            );
        }

        let change = if versions.is_empty() {
            Some((AddonStatus::Null, "no versions"))
        } else if file_statuses.is_empty() {
            Some((AddonStatus::Null, "no versions with files"))
        } else if addon.status == AddonStatus::Public
            && !file_statuses.contains(&AddonStatus::Public)
        {
            if file_statuses.contains(&AddonStatus::Lite) {
                Some((AddonStatus::Lite, "only lite files"))
            } else {
                Some((AddonStatus::Unreviewed, "no reviewed files"))
            }
        } else {
            None
        };

        if let Some((status, reason)) = change {
            self.change_status(ctx, &mut addon, status, reason).await?;
        }
        Ok(addon.status)
    }

    async fn change_status(
        &self,
        ctx: &RequestContext,
        addon: &mut Addon,
        status: AddonStatus,
        reason: &str,
    ) -> Result<()> {
        let old = addon.status;
        addon.status = status;
        self.store.save_addon(addon).await?;

        info!(
            addon_id = addon.id,
            old = old.display_name(),
            new = status.display_name(),
            reason,
            "Add-on status changed"
        );
        self.activity
            .log(
                ctx,
                ActivityAction::ChangeStatus,
                vec![LogArgument::text(status.display_name()), LogArgument::from(&*addon)],
            )
            .await?;
        Ok(())
    }

    async fn require_addon(&self, addon_id: u64) -> Result<Addon> {
        self.store
            .find_addon(addon_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Addon", addon_id))
    }
}
