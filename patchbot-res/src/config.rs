use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::changelog::DEFAULT_CHANGELOG_PATH;

/// The settings shared by each step of a patching run.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    /// Additional files to download, each in `url@name.apk` format.
    pub extra_download_files: Vec<String>,
    /// If true, nothing is downloaded and the Java check is skipped.
    pub dry_run: bool,
    /// Directory that downloaded files are saved to.
    pub temp_folder: PathBuf,
    /// Token passed to the GitHub API, if any. Unauthenticated requests are heavily rate limited.
    pub github_token: Option<String>,
    /// Path of the changelog that release notes are appended to.
    pub changelog_path: PathBuf,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            extra_download_files: Vec::new(),
            dry_run: false,
            temp_folder: PathBuf::from("apks"),
            github_token: None,
            changelog_path: PathBuf::from(DEFAULT_CHANGELOG_PATH),
        }
    }
}

impl PatcherConfig {
    /// Loads the config from a JSON file. Any settings missing from the file take their default value.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        info!("Loading config from {:?}", path.as_ref());
        let handle = std::fs::File::open(path.as_ref()).context("Opening config file")?;

        serde_json::from_reader(handle).context("Config file was invalid JSON")
    }

    /// Loads the config from `path` if given, otherwise uses the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Splits a comma separated list of extra files, ignoring blank entries.
pub fn parse_extra_files(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
