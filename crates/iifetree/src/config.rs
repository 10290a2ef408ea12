//! Build configuration.
//!
//! Settings are read from the first file found among:
//! 1. the path given with `--config`,
//! 2. `iifetree.toml` in the project root,
//! 3. `iifetree/config.toml` in the user configuration directory.
//!
//! Missing keys take their default value; command-line flags are applied on
//! top by the caller.
//!
//! ```toml
//! src = ["src"]
//! output = "core.js"
//! header-file = "umd/header.js"
//! footer-file = "umd/footer.js"
//! hyphens = "all"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use etcetera::{BaseStrategy, choose_base_strategy};
use log::debug;
use serde::Deserialize;

use crate::{
    bundler::{BundleOptions, DEFAULT_OUTPUT},
    namespace::HyphenMode,
    statement_rewriter::RewriteOptions,
};

/// Name of the project-level configuration file.
pub const CONFIG_FILE_NAME: &str = "iifetree.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Directories or files to bundle, relative to the project root.
    pub src: Vec<PathBuf>,
    /// Output file name, written to the project root.
    pub output: String,
    /// Module file extensions, without the dot.
    pub extensions: Vec<String>,
    pub header: Option<String>,
    pub footer: Option<String>,
    /// Read the header from this file when `header` is not set.
    pub header_file: Option<PathBuf>,
    /// Read the footer from this file when `footer` is not set.
    pub footer_file: Option<PathBuf>,
    pub hyphens: HyphenMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src: vec![PathBuf::from("src")],
            output: DEFAULT_OUTPUT.to_owned(),
            extensions: vec!["js".to_owned()],
            header: None,
            footer: None,
            header_file: None,
            footer_file: None,
            hyphens: HyphenMode::default(),
        }
    }
}

impl Config {
    /// Load the configuration for the project at `root`.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let project = root.join(CONFIG_FILE_NAME);
        if project.is_file() {
            return Self::from_file(&project);
        }

        if let Some(user) = user_config_path().filter(|path| path.is_file()) {
            return Self::from_file(&user);
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Resolve header and footer files against `root` and build the options
    /// of a run.
    pub fn bundle_options(&self, root: &Path) -> Result<BundleOptions> {
        Ok(BundleOptions {
            output: self.output.clone(),
            header: resolve_text(self.header.as_deref(), self.header_file.as_deref(), root)?,
            footer: resolve_text(self.footer.as_deref(), self.footer_file.as_deref(), root)?,
            rewrite: RewriteOptions {
                hyphens: self.hyphens,
                extensions: self.extensions.clone(),
            },
        })
    }
}

/// `<config dir>/iifetree/config.toml`, when a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    let Ok(strategy) = choose_base_strategy() else {
        return None;
    };
    Some(strategy.config_dir().join("iifetree").join("config.toml"))
}

fn resolve_text(inline: Option<&str>, file: Option<&Path>, root: &Path) -> Result<Option<String>> {
    if let Some(text) = inline {
        return Ok(Some(text.to_owned()));
    }
    let Some(file) = file else {
        return Ok(None);
    };
    let path = root.join(file);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Some(text))
}
