//! Marketplace Development Tool
//!
//! Works against an in-memory catalog seeded with sample data:
//! - `check` validates the configuration and the action table
//! - `activity` records sample activity and prints the rendered history
//! - `receipt` builds and signs a purchase receipt
//! - `config-example` prints a documented configuration file

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::info;

use mp_common::logging::init_logging;
use mp_config::{AppConfig, ConfigLoader};
use mp_platform::activity::{
    validate_registry, ActivityAction, ActivityService, InMemoryActivityLogRepository, LogOptions,
    ObjectKind,
};
use mp_platform::catalog::{
    Addon, AddonStatus, CatalogResolver, CatalogService, File, Group, InMemoryCatalog, Installed,
    Tag, User, Version,
};
use mp_platform::receipt::{Receipt, ReceiptFlavour, ReceiptService, ReceiptSigner};
use mp_platform::RequestContext;

const ADMIN: u64 = 1;
const REVIEWER: u64 = 2;
const DEVELOPER: u64 = 3;
const BUYER: u64 = 4;
const ADDON: u64 = 3615;

/// Marketplace development tool
#[derive(Parser, Debug)]
#[command(name = "mp-dev")]
#[command(about = "Marketplace development tool - activity log and receipt playground")]
struct Args {
    /// Configuration file (defaults to the standard search paths)
    #[arg(long, env = "MARKETPLACE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and the action table
    Check,
    /// Record sample activity and print the rendered history
    Activity,
    /// Build and sign a receipt for a seeded installation
    Receipt {
        /// Installation id (1 = buyer, 2 = reviewer, 3 = developer)
        #[arg(long, default_value = "1")]
        installed: u64,

        /// developer or reviewer
        #[arg(long)]
        flavour: Option<ReceiptFlavour>,

        /// RSA private key, overrides `receipts.key_path`
        #[arg(long)]
        key: Option<String>,

        /// Print the claims instead of signing them
        #[arg(long)]
        unsigned: bool,
    },
    /// Print an example configuration file
    ConfigExample,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("mp-dev");
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };

    match args.command {
        Command::ConfigExample => {
            println!("{}", AppConfig::example_toml());
            Ok(())
        }
        Command::Check => {
            let config = loader.load().context("Failed to load configuration")?;
            check(&config)
        }
        Command::Activity => {
            let config = loader.load().context("Failed to load configuration")?;
            activity(&config).await
        }
        Command::Receipt {
            installed,
            flavour,
            key,
            unsigned,
        } => {
            let mut config = loader.load().context("Failed to load configuration")?;
            if let Some(key) = key {
                config.receipts.key_path = key;
            }
            receipt(&config, installed, flavour, unsigned).await
        }
    }
}

fn check(config: &AppConfig) -> Result<()> {
    if let Err(errors) = validate_registry() {
        for error in &errors {
            eprintln!("{}", error);
        }
        anyhow::bail!("{} problem(s) in the action table", errors.len());
    }
    info!(
        actions = ActivityAction::ALL.len(),
        site = %config.site.url,
        signing_server = config.signing.active,
        "Configuration and action table are valid"
    );
    println!("OK: {} actions, site {}", ActivityAction::ALL.len(), config.site.url);
    Ok(())
}

fn seed_catalog() -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());

    catalog.insert_user(User::new(ADMIN, "admin").with_display_name("Admin").with_permission("*:*"));
    catalog.insert_user(
        User::new(REVIEWER, "reviewer")
            .with_display_name("Rita Reviewer")
            .with_permission("Apps:Review"),
    );
    catalog.insert_user(User::new(DEVELOPER, "developer").with_display_name("Dev Eloper"));
    catalog.insert_user(User::new(BUYER, "buyer"));

    catalog.insert_addon(
        Addon::new(ADDON, "Delicious Bookmarks", "a3615")
            .with_origin("http://bookmarks.example")
            .with_author(DEVELOPER),
    );
    catalog.insert_version(Version::new(1, ADDON, "1.0"));
    catalog.insert_file(File::new(10, 1, "delicious-1.0.xpi", AddonStatus::Public));
    catalog.insert_version(Version::new(2, ADDON, "1.1b1"));
    catalog.insert_file(File::new(11, 2, "delicious-1.1b1.xpi", AddonStatus::Beta));

    catalog.insert_tag(Tag::new(1, "bookmarks"));
    catalog.insert_group(Group::new(1, "App Reviewers"));

    catalog.insert_installed(Installed::new(1, ADDON, BUYER));
    catalog.insert_installed(Installed::new(2, ADDON, REVIEWER));
    catalog.insert_installed(Installed::new(3, ADDON, DEVELOPER));

    catalog
}

async fn activity(config: &AppConfig) -> Result<()> {
    let catalog = seed_catalog();
    let activity = Arc::new(ActivityService::new(
        Arc::new(InMemoryActivityLogRepository::new()),
        Arc::new(CatalogResolver::new(catalog.clone())),
        &config.site,
        &config.activity,
    ));
    let lifecycle = CatalogService::new(catalog.clone(), activity.clone());

    let developer = RequestContext::for_actor(DEVELOPER);
    let reviewer = RequestContext::for_actor(REVIEWER);
    let admin = RequestContext::for_actor(ADMIN);
    let addon = (ObjectKind::Addon, ADDON);

    activity
        .log(&developer, ActivityAction::CreateAddon, vec![addon.into()])
        .await?;
    activity
        .log(&developer, ActivityAction::AddTag, vec![(ObjectKind::Tag, 1).into(), addon.into()])
        .await?;
    activity
        .log_with(
            &reviewer,
            ActivityAction::ApproveVersion,
            vec![addon.into(), (ObjectKind::Version, 1).into()],
            LogOptions::new().details(serde_json::json!({"comments": "Works as advertised."})),
        )
        .await?;
    activity
        .log(
            &admin,
            ActivityAction::GroupUserAdded,
            vec![(ObjectKind::Group, 1).into(), (ObjectKind::User, REVIEWER).into()],
        )
        .await?;
    lifecycle.delete_version(&developer, 1).await?;

    println!("History of add-on {}:", ADDON);
    for entry in activity.for_addons(&[ADDON]).await? {
        println!("  [{}] {}", entry.created.format("%Y-%m-%d %H:%M:%S"), activity.render(&entry).await?);
    }

    println!("Admin events:");
    for entry in activity.admin_events().await? {
        println!("  {}", activity.render(&entry).await?);
    }

    println!("Reviewers this month:");
    for row in activity.monthly_reviews().await? {
        println!("  {:<20} {}", row.display_name, row.approval_count);
    }
    Ok(())
}

/// Returns the claims as pretty JSON instead of a token.
struct PreviewSigner;

#[async_trait]
impl ReceiptSigner for PreviewSigner {
    fn name(&self) -> &'static str {
        "preview"
    }

    async fn sign(&self, receipt: &Receipt) -> mp_platform::Result<String> {
        Ok(serde_json::to_string_pretty(receipt)?)
    }
}

async fn receipt(
    config: &AppConfig,
    installed: u64,
    flavour: Option<ReceiptFlavour>,
    unsigned: bool,
) -> Result<()> {
    let catalog = seed_catalog();

    let service = if unsigned {
        ReceiptService::new(
            catalog,
            Arc::new(PreviewSigner),
            config.site.clone(),
            config.receipts.clone(),
        )
    } else {
        ReceiptService::from_config(catalog, config).context("Failed to set up receipt signing")?
    };

    let token = service.create_receipt(installed, flavour).await?;
    info!(installed, signer = service.signer_name(), "Receipt created");
    println!("{}", token);
    Ok(())
}
