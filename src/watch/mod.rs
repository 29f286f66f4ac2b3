//! Continuous-run watch mode.
//!
//! State machine: wait for the API to answer, acquire a token, register the
//! filesystem listener, run the store's initial load, then process change
//! events one at a time. The listener is registered before the initial load
//! so events fired during the load replay land in the channel; they are
//! drained and dropped before `watching` flips true. A single consumer loop
//! serializes change handling, so overlapping events cannot race.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::config::SiteConfig;
use crate::content::ContentType;
use crate::credentials;
use crate::publish::{ImageValidator, Publisher};
use crate::source::ContentRepository;

/// How long to wait for the API before giving up, fatally.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay after a change event so the changed file settles on disk.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Mutable watch-mode state: the token acquired once after readiness and
/// auth, and whether change events are being processed yet. Both live for
/// the process lifetime; transitions happen through the methods below.
#[derive(Debug, Default)]
pub struct WatchState {
    token: Option<String>,
    watching: bool,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the token obtained after readiness and auth succeeded.
    pub fn authenticated(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Marks the initial-load replay finished; events are processed from
    /// here on.
    pub fn start_watching(&mut self) {
        self.watching = true;
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }
}

/// Options for one watch run.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub service: String,
    pub author: String,
    pub deploy_assets_dir: PathBuf,
    pub ready_timeout: Duration,
    pub settle_delay: Duration,
}

impl WatchOptions {
    pub fn new(
        service: impl Into<String>,
        author: impl Into<String>,
        deploy_assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            service: service.into(),
            author: author.into(),
            deploy_assets_dir: deploy_assets_dir.into(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Long-running watcher republishing items as their source files change.
pub struct WatchController<R, V> {
    api: ApiClient,
    repo: R,
    validator: V,
    base_url: String,
    skip_patterns: Vec<String>,
    watch_dir: PathBuf,
    options: WatchOptions,
    state: WatchState,
}

impl<R: ContentRepository, V: ImageValidator> WatchController<R, V> {
    pub fn new(
        api: ApiClient,
        repo: R,
        validator: V,
        config: &SiteConfig,
        watch_dir: impl Into<PathBuf>,
        options: WatchOptions,
    ) -> Self {
        Self {
            api,
            repo,
            validator,
            base_url: config.url.clone(),
            skip_patterns: config.skip_paths.clone(),
            watch_dir: watch_dir.into(),
            options,
            state: WatchState::new(),
        }
    }

    /// Stores the token and switches the API client to authorized calls.
    pub fn mark_authenticated(&mut self, token: String) {
        self.api = self.api.authorized(&token);
        self.state.authenticated(token);
    }

    /// Flips steady-state watching on.
    pub fn mark_watching(&mut self) {
        self.state.start_watching();
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Runs until the process is terminated. Readiness timeout and auth
    /// failures are fatal; everything after that is isolated per event.
    pub async fn run(mut self) -> Result<()> {
        self.api.wait_until_ready(self.options.ready_timeout).await?;

        let author = self
            .api
            .resolve_author(&self.options.author)
            .await
            .with_context(|| format!("Author lookup failed: {}", self.options.author))?;
        let password = credentials::get_password(&self.options.service, &self.options.author)
            .with_context(|| {
                format!(
                    "No credential stored for {}/{}",
                    self.options.service, self.options.author
                )
            })?;
        let token = self
            .api
            .obtain_token(&author.id, &password)
            .await
            .context("Token exchange failed")?;
        self.mark_authenticated(token);

        match self.api.invalidate_caches().await {
            Ok(()) => info!("Caches: invalidated"),
            Err(e) => error!("Cache invalidation failed: {e}"),
        }

        // Register the listener before the initial load; events fired as a
        // side effect of the replay land in the channel and are dropped.
        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(DEBOUNCE_WINDOW, tx)?;
        debouncer
            .watcher()
            .watch(&self.watch_dir, RecursiveMode::Recursive)?;

        let articles = self.repo.list_items(ContentType::Article, None).await?;
        let pages = self.repo.list_items(ContentType::Page, None).await?;
        info!(
            "Content store initialized: {} articles, {} pages",
            articles.len(),
            pages.len()
        );

        while rx.try_recv().is_ok() {}
        self.mark_watching();
        info!("Watch mode started. Files will be sent to API on change.");

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(events)) => {
                    for event in events {
                        if event.kind != DebouncedEventKind::Any {
                            continue;
                        }
                        self.handle_change(&event.path).await;
                    }
                }
                Ok(Err(e)) => warn!("Watcher error: {e:?}"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("Watcher channel disconnected")
                }
            }
            tokio::task::yield_now().await;
        }
    }

    /// Handles one debounced change event: resolve the file to a content
    /// item (articles first, then pages) and republish it. Events arriving
    /// before watching started, non-markdown files, and unresolved paths
    /// are ignored.
    pub async fn handle_change(&self, path: &Path) {
        if !self.state.is_watching() {
            return;
        }
        if path.extension() != Some(OsStr::new("md")) {
            return;
        }

        // let the store's view of the file settle
        tokio::time::sleep(self.options.settle_delay).await;
        info!("File changed: {}", path.display());

        let resolved = match self.repo.find_by_path(path).await {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("Change lookup failed for {}: {e}", path.display());
                return;
            }
        };
        let Some((item, content_type)) = resolved else {
            info!("Content not found for: {}", path.display());
            return;
        };

        let publisher = Publisher::new(
            &self.api,
            &self.repo,
            &self.validator,
            &self.base_url,
            &self.skip_patterns,
            &self.options.deploy_assets_dir,
        );
        publisher.publish_item(&item, content_type).await;
    }
}
