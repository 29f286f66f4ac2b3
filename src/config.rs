//! Site configuration.
//!
//! Read from `_config.yml` at the corpus root. Carries the public base URL
//! (used to decide which links are external), the source directory name,
//! and the skip patterns excluding paths from publication.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Paths excluded from publication when the config does not override them.
pub const DEFAULT_SKIP_PATHS: &[&str] = &[
    "temp/**",
    "all-categories/**",
    "all-archives/**",
    "scaffolds/**",
    "404/**",
    "_drafts/**",
];

const CONFIG_FILE: &str = "_config.yml";

/// Resolved site configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Public base URL of the site, e.g. `https://blog.example.com`.
    pub url: String,

    /// Directory under the corpus root holding the content tree.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Glob patterns excluding content paths from publication.
    #[serde(default = "default_skip_paths")]
    pub skip_paths: Vec<String>,
}

fn default_source_dir() -> String {
    "source".to_string()
}

fn default_skip_paths() -> Vec<String> {
    DEFAULT_SKIP_PATHS.iter().map(|p| p.to_string()).collect()
}

impl SiteConfig {
    /// Loads `_config.yml` from the corpus root.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read site config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse site config: {}", path.display()))
    }
}
