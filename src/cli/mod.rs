//! Command-line interface for mdpress.
//!
//! One process per command. Commands talking to the API share the
//! `--api-url` / `--service` / `--author` flags and authenticate through
//! the keychain before doing anything else.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use crate::api::ApiClient;
use crate::config::SiteConfig;
use crate::content::ContentType;
use crate::credentials;
use crate::publish::{ExifImageValidator, ImageValidator, Publisher};
use crate::source::{ContentRepository, FileStore};
use crate::watch::{WatchController, WatchOptions};

/// mdpress - Markdown corpus publisher
#[derive(Parser, Debug)]
#[command(name = "mdpress")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that talks to the content API.
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Base URL of the content API
    #[arg(long)]
    pub api_url: String,

    /// Service name the credential is stored under
    #[arg(long)]
    pub service: String,

    /// Author account name
    #[arg(long)]
    pub author: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish recently updated content as a one-shot batch
    Publish {
        #[command(flatten)]
        api: ApiArgs,

        /// Only publish items updated within this many days
        #[arg(long, default_value_t = 5)]
        days_ago: i64,

        /// Directory receiving validated media assets for deployment
        #[arg(long)]
        deploy_assets_dir: Option<PathBuf>,

        /// Corpus root holding _config.yml and the source tree
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Watch the corpus and republish items as their files change
    Watch {
        #[command(flatten)]
        api: ApiArgs,

        /// Directory receiving validated media assets for deployment
        #[arg(long)]
        deploy_assets_dir: Option<PathBuf>,

        /// Corpus root holding _config.yml and the source tree
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Delete one published content item
    DeleteContent {
        #[command(flatten)]
        api: ApiArgs,

        /// Id of the content item to delete
        #[arg(long)]
        content_id: String,
    },

    /// Delete a tag
    DeleteTag {
        #[command(flatten)]
        api: ApiArgs,

        /// Id of the tag to delete
        #[arg(long)]
        tag_id: String,
    },

    /// Invalidate the API's caches
    InvalidateCaches {
        #[command(flatten)]
        api: ApiArgs,
    },

    /// Create series from a JSON file (an array of series objects)
    PostSeries {
        #[command(flatten)]
        api: ApiArgs,

        /// Path to the series JSON file
        #[arg(long)]
        file_path: PathBuf,
    },

    /// Store an author password in the OS keychain
    SetCredential,

    /// Audit recently updated items' images for EXIF GPS data
    CheckImages {
        /// Only check items updated within this many days
        #[arg(long, default_value_t = 10000)]
        days_ago: i64,

        /// Corpus root holding _config.yml and the source tree
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Publish {
                api,
                days_ago,
                deploy_assets_dir,
                root,
            } => publish(api, days_ago, deploy_assets_dir, root).await,
            Commands::Watch {
                api,
                deploy_assets_dir,
                root,
            } => watch(api, deploy_assets_dir, root).await,
            Commands::DeleteContent { api, content_id } => delete_content(api, &content_id).await,
            Commands::DeleteTag { api, tag_id } => delete_tag(api, &tag_id).await,
            Commands::InvalidateCaches { api } => invalidate_caches(api).await,
            Commands::PostSeries { api, file_path } => post_series(api, file_path).await,
            Commands::SetCredential => set_credential(),
            Commands::CheckImages { days_ago, root } => check_images(days_ago, root).await,
        }
    }
}

/// Resolves the author, exchanges the stored credential for a token, and
/// returns an authorized client. Any failure here is fatal: nothing can
/// proceed without a token.
async fn login(api: &ApiArgs) -> Result<ApiClient> {
    let password = credentials::get_password(&api.service, &api.author).with_context(|| {
        format!("No credential stored for {}/{}", api.service, api.author)
    })?;

    let client = ApiClient::new(&api.api_url);
    let author = client
        .resolve_author(&api.author)
        .await
        .with_context(|| format!("Author lookup failed: {}", api.author))?;
    let token = client
        .obtain_token(&author.id, &password)
        .await
        .context("Token exchange failed")?;

    Ok(client.authorized(token))
}

/// Best-effort cache invalidation after a mutating command.
async fn invalidate_caches_logged(client: &ApiClient) {
    match client.invalidate_caches().await {
        Ok(()) => info!("Caches: invalidated"),
        Err(e) => error!("Cache invalidation failed: {e}"),
    }
}

/// One-shot batch publish of items updated within the last `days_ago` days.
async fn publish(
    api: ApiArgs,
    days_ago: i64,
    deploy_assets_dir: Option<PathBuf>,
    root: PathBuf,
) -> Result<()> {
    let Some(deploy_assets_dir) = deploy_assets_dir else {
        bail!("Error: --deploy-assets-dir is required");
    };

    let config = SiteConfig::load(&root)?;
    let store = FileStore::open(&root, &config);

    let client = login(&api).await?;
    invalidate_caches_logged(&client).await;

    let since = Utc::now() - chrono::Duration::days(days_ago);
    let validator = ExifImageValidator;
    let publisher = Publisher::new(
        &client,
        &store,
        &validator,
        &config.url,
        &config.skip_paths,
        &deploy_assets_dir,
    );

    let articles = store.list_items(ContentType::Article, Some(since)).await?;
    let mut attempted = publisher.publish_batch(&articles, ContentType::Article).await;

    let pages = store.list_items(ContentType::Page, Some(since)).await?;
    attempted += publisher.publish_batch(&pages, ContentType::Page).await;

    info!("Publish finished: {attempted} items attempted");
    Ok(())
}

/// Runs watch mode indefinitely.
async fn watch(api: ApiArgs, deploy_assets_dir: Option<PathBuf>, root: PathBuf) -> Result<()> {
    let Some(deploy_assets_dir) = deploy_assets_dir else {
        bail!("Error: --deploy-assets-dir is required");
    };

    let config = SiteConfig::load(&root)?;
    let store = FileStore::open(&root, &config);
    let watch_dir = store.source_dir().to_path_buf();

    let controller = WatchController::new(
        ApiClient::new(&api.api_url),
        store,
        ExifImageValidator,
        &config,
        watch_dir,
        WatchOptions::new(api.service, api.author, deploy_assets_dir),
    );
    controller.run().await
}

async fn delete_content(api: ApiArgs, content_id: &str) -> Result<()> {
    let client = login(&api).await?;
    client
        .delete_content(content_id)
        .await
        .with_context(|| format!("Failed to delete content {content_id}"))?;
    info!("Content deleted: {content_id}");
    invalidate_caches_logged(&client).await;
    Ok(())
}

async fn delete_tag(api: ApiArgs, tag_id: &str) -> Result<()> {
    let client = login(&api).await?;
    client
        .delete_tag(tag_id)
        .await
        .with_context(|| format!("Failed to delete tag {tag_id}"))?;
    info!("Tag deleted: {tag_id}");
    invalidate_caches_logged(&client).await;
    Ok(())
}

async fn invalidate_caches(api: ApiArgs) -> Result<()> {
    let client = login(&api).await?;
    client
        .invalidate_caches()
        .await
        .context("Cache invalidation failed")?;
    info!("Caches: invalidated");
    Ok(())
}

/// Forwards each object of a series JSON array to the API verbatim.
async fn post_series(api: ApiArgs, file_path: PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(&file_path)
        .with_context(|| format!("Failed to read series file: {}", file_path.display()))?;
    let series: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("Not a JSON array of series: {}", file_path.display()))?;

    let client = login(&api).await?;
    for entry in &series {
        client.create_series(entry).await?;
    }
    info!("Series created: {}", series.len());
    invalidate_caches_logged(&client).await;
    Ok(())
}

/// Interactive credential setup.
fn set_credential() -> Result<()> {
    print!("Please input serviceName, authorName, and author's password: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let (Some(service), Some(author), Some(password)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("Expected: <service> <author> <password>");
    };

    credentials::set_password(service, author, password)?;
    println!("Credential set successfully.");
    Ok(())
}

/// Validates the assets of recently updated items without touching the
/// network. Exits non-zero when any image fails validation.
async fn check_images(days_ago: i64, root: PathBuf) -> Result<()> {
    let config = SiteConfig::load(&root)?;
    let store = FileStore::open(&root, &config);
    let validator = ExifImageValidator;

    let since = Utc::now() - chrono::Duration::days(days_ago);
    info!("Checking assets of items updated in the last {days_ago} days");

    let mut flagged = 0usize;
    for kind in [ContentType::Article, ContentType::Page] {
        for item in store.list_items(kind, Some(since)).await? {
            for asset in store.assets_for(&item, kind).await? {
                if !validator.is_valid(&asset.source).await {
                    error!("Invalid image: {}", asset.source.display());
                    flagged += 1;
                }
            }
        }
    }

    if flagged > 0 {
        bail!("{flagged} invalid image(s) found");
    }
    info!("All images valid");
    Ok(())
}
