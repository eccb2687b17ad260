//! Receipt Service
//!
//! Builds purchase receipts for installations, checks who may get the
//! developer and reviewer variants, and signs them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mp_config::{AppConfig, ReceiptConfig, SiteConfig};
use tracing::{debug, info};

use super::cache::ReceiptCache;
use super::entity::{
    Receipt, ReceiptFlavour, ReceiptProduct, ReceiptUser, DIRECTED_IDENTIFIER, RECEIPT_TYPE,
    REVIEWER_EXPIRY_SECS,
};
use super::signer::{signer_from_config, ReceiptSigner};
use crate::catalog::CatalogStore;
use crate::shared::acl::{self, permissions};
use crate::shared::error::{PlatformError, Result};

pub struct ReceiptService {
    catalog: Arc<dyn CatalogStore>,
    signer: Arc<dyn ReceiptSigner>,
    cache: ReceiptCache,
    site: SiteConfig,
    receipts: ReceiptConfig,
}

impl ReceiptService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        signer: Arc<dyn ReceiptSigner>,
        site: SiteConfig,
        receipts: ReceiptConfig,
    ) -> Self {
        let cache = ReceiptCache::new(Duration::from_secs(receipts.cache_ttl_secs));
        Self {
            catalog,
            signer,
            cache,
            site,
            receipts,
        }
    }

    /// Service with the signer selected by the `[signing]` section.
    pub fn from_config(catalog: Arc<dyn CatalogStore>, config: &AppConfig) -> Result<Self> {
        let signer = signer_from_config(&config.signing, &config.receipts)?;
        Ok(Self::new(
            catalog,
            signer,
            config.site.clone(),
            config.receipts.clone(),
        ))
    }

    pub fn signer_name(&self) -> &'static str {
        self.signer.name()
    }

    /// Signed receipt for an installation. Repeated requests within the cache
    /// TTL return the same token.
    pub async fn create_receipt(
        &self,
        installed_id: u64,
        flavour: Option<ReceiptFlavour>,
    ) -> Result<String> {
        if let Some(token) = self.cache.get(installed_id, flavour) {
            debug!(installed_id, flavour = ?flavour, "Receipt served from cache");
            return Ok(token);
        }

        let receipt = self
            .build_receipt(installed_id, flavour, Utc::now().timestamp())
            .await?;
        let token = self.signer.sign(&receipt).await?;
        self.cache.insert(installed_id, flavour, token.clone());

        info!(
            installed_id,
            flavour = ?flavour,
            signer = self.signer.name(),
            exp = receipt.exp,
            "Receipt signed"
        );
        Ok(token)
    }

    /// Unsigned claims issued at `now` (unix seconds).
    pub async fn build_receipt(
        &self,
        installed_id: u64,
        flavour: Option<ReceiptFlavour>,
        now: i64,
    ) -> Result<Receipt> {
        let installed = self
            .catalog
            .find_installed(installed_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Installed", installed_id))?;
        let addon = self
            .catalog
            .find_addon(installed.addon_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Addon", installed.addon_id))?;

        if flavour.is_some() {
            let user = self
                .catalog
                .find_user(installed.user_id)
                .await?
                .ok_or_else(|| PlatformError::not_found("User", installed.user_id))?;
            let reviewer = acl::permission_allowed(&user.permissions, permissions::APPS_REVIEW);
            if !(reviewer || addon.has_author(user.id)) {
                return Err(PlatformError::permission_denied(format!(
                    "User {} is not a reviewer or developer",
                    user.id
                )));
            }
        }

        let lifetime = match flavour {
            Some(ReceiptFlavour::Reviewer) => REVIEWER_EXPIRY_SECS,
            _ => self.receipts.expiry_seconds,
        };
        let exp = now.checked_add(lifetime).ok_or_else(|| {
            PlatformError::validation(format!(
                "Receipt expiry of {} seconds overflows the issue time {}",
                lifetime, now
            ))
        })?;

        let locale = &self.site.locale;
        let verify = match flavour {
            Some(_) => self.absolutify(&format!("/verify/{}", addon.app_slug)),
            None => format!("{}{}", self.receipts.receipt_url, addon.id),
        };

        Ok(Receipt {
            detail: self.absolutify(&format!("/{}/purchases/{}/receipt", locale, addon.id)),
            exp,
            iat: now,
            iss: self.site.url.clone(),
            nbf: now,
            product: ReceiptProduct {
                url: addon.origin.clone(),
                storedata: format!("id={}", urlencoding::encode(&addon.id.to_string())),
                flavour,
            },
            reissue: self.absolutify(&format!(
                "/{}/app/{}/purchase/reissue",
                locale, addon.app_slug
            )),
            typ: RECEIPT_TYPE.to_string(),
            user: ReceiptUser {
                user_type: DIRECTED_IDENTIFIER.to_string(),
                value: installed.uuid,
            },
            verify,
        })
    }

    fn absolutify(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.site.url.trim_end_matches('/'), path)
    }
}
