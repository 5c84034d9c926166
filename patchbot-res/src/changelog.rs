//! Writes the changelogs of the patch resources used in a run to a markdown file.
//! Each release becomes one collapsible `<details>` block, appended in the order releases are recorded.

use std::{fs::OpenOptions, io::Write, path::Path};

use anyhow::{Context, Result};
use const_format::formatcp;

use crate::github::ReleaseInfo;

pub const DEFAULT_CHANGELOG_PATH: &str = "changelog.md";

const PARENT_REPO: &str = "https://github.com/nikhilbadyal/docker-py-revanced";
const FOOTER: &str = formatcp!("<br><sub>Change logs generated by [Docker Py Revanced]({PARENT_REPO})</sub>\n");

/// Renders the changelog block for a single release.
pub fn format_entry(name: &str, release: &ReleaseInfo) -> String {
    let collapse_start = format!("\n<details> <summary>👀 {name} </summary>\n\n");
    let release_version = format!("**Release Version** - [{}]({})<br>", release.tag_name, release.html_url);
    let change_log = format!("**Changelog** -<br> {}", release.body);
    let publish_time = format!("**Published at** -<br> {}", release.published_at);

    [
        collapse_start.as_str(),
        release_version.as_str(),
        change_log.as_str(),
        publish_time.as_str(),
        FOOTER,
        "</details>",
    ]
    .concat()
}

/// An append-only changelog backed by any writable sink.
/// Entries are never deduplicated: recording the same release twice writes it twice.
pub struct Changelog<W: Write> {
    sink: W,
}

impl<W: Write> Changelog<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Writes the entry for `release` to the end of the changelog.
    pub fn append(&mut self, name: &str, release: &ReleaseInfo) -> Result<()> {
        self.sink
            .write_all(format_entry(name, release).as_bytes())
            .context("Writing changelog entry")?;
        self.sink.flush().context("Flushing changelog")?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl Changelog<std::fs::File> {
    /// Opens the changelog file at `path` for appending, creating it if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .with_context(|| format!("Opening changelog {:?} for appending", path.as_ref()))?;

        Ok(Self::new(handle))
    }
}

/// Appends a single entry to the changelog file at `path`.
pub fn update_changelog(path: impl AsRef<Path>, name: &str, release: &ReleaseInfo) -> Result<()> {
    Changelog::open(path)?.append(name, release)
}
