//! Downloading of patch resources and other files into the temp folder.
//! GitHub release URLs are resolved to the first release asset matching a name filter,
//! any other URL is downloaded as-is.

use std::{fs::OpenOptions, io::{self, Read, Write}, path::{Path, PathBuf}, time::{Duration, Instant}};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use regex::Regex;

use crate::{config::PatcherConfig, default_agent::get_agent, github};

// Minimum time between progress updates in the log.
const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_secs(2);

/// Something able to fetch a file for the patching run.
pub trait Downloader {
    /// Downloads from `url` to `file_name` within the temp folder of `config`.
    /// If `url` refers to a set of release assets, the first asset with a name matching `assets_filter` is downloaded.
    fn download(&self, url: &str, config: &PatcherConfig, assets_filter: &str, file_name: &str) -> Result<()>;
}

/// Downloads files over HTTP using the shared ureq agent.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpDownloader;

impl HttpDownloader {
    /// Works out the URL of the file to download.
    fn resolve_url(&self, url: &str, config: &PatcherConfig, assets_filter: &str) -> Result<String> {
        let (repo, tag) = match github::parse_release_url(url) {
            Some(release) => release,
            None => return Ok(url.to_string()),
        };

        let filter = Regex::new(assets_filter).context("Assets filter was not a valid regex")?;
        let release = github::get_release(&repo, tag.as_deref(), config.github_token.as_deref())
            .with_context(|| format!("Fetching release of {}/{}", repo.owner, repo.repo))?;

        match release.find_asset(&filter) {
            Some(asset) => {
                info!("Using asset {} from {}/{} {}", asset.name, repo.owner, repo.repo, release.tag_name);
                Ok(asset.browser_download_url.clone())
            }
            None => Err(anyhow!(
                "No asset matching {assets_filter} in release {} of {}/{}",
                release.tag_name,
                repo.owner,
                repo.repo
            )),
        }
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, config: &PatcherConfig, assets_filter: &str, file_name: &str) -> Result<()> {
        let destination = config.temp_folder.join(file_name);
        if config.dry_run {
            info!("Dry run: skipping download of {url} to {destination:?}");
            return Ok(());
        }

        let download_url = self.resolve_url(url, config, assets_filter)?;
        download_to_path(&download_url, destination)
    }
}

/// Downloads `url` to the file at `to`, overwriting it if it already exists.
pub fn download_to_path(url: &str, to: PathBuf) -> Result<()> {
    info!("Downloading {url} to {to:?}");
    let resp = match get_agent().get(url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, _resp)) => return Err(anyhow!("Request for {url} failed as got status {code} from server.")),
        Err(err) => return Err(err).context("Failed to make download request"),
    };

    let content_length: Option<usize> = resp.header("Content-Length")
        .and_then(|length_str| length_str.parse().ok());

    let total = write_download(&mut resp.into_reader(), &to, content_length)?;
    info!("Downloaded {total} bytes to {to:?}");
    Ok(())
}

/// Writes a download body to the file at `to`, overwriting it if it already exists.
/// If the body cannot be read in full, the partially written file is removed.
fn write_download(from: &mut impl Read, to: &Path, content_length: Option<usize>) -> Result<usize> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).context("Failed to create download directory")?;
    }
    let mut writer = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(to)
        .context("Failed to create destination file")?;

    let mut last_progress_update = Instant::now();
    let result = copy_stream_progress(from, &mut writer, |bytes_written| {
        let now = Instant::now();
        if let Some(length) = content_length {
            if now.duration_since(last_progress_update) > PROGRESS_UPDATE_INTERVAL {
                last_progress_update = now;
                info!("Progress: {:.2}%", (bytes_written as f32 / length as f32) * 100.0);
            }
        }
    });

    match result {
        Ok(total) => Ok(total),
        Err(err) => {
            drop(writer);
            if let Err(remove_err) = std::fs::remove_file(to) {
                warn!("Failed to remove partial download {to:?}: {remove_err}");
            }
            Err(err).context("Lost connection mid download")
        }
    }
}

/// Copies bytes from the `from` stream to the `to` stream, calling `progress` with the number of bytes copied thus far
/// after each buffer. Returns the total number of bytes copied.
fn copy_stream_progress<T: FnMut(usize)>(from: &mut impl Read,
    mut to: impl Write,
    mut progress: T
    ) -> Result<usize, io::Error> {
    let mut buffer = vec![0u8; 8192];

    let mut total_read = 0;
    loop {
        let bytes_read = from.read(&mut buffer)?;
        if bytes_read == 0 {
            to.flush()?;
            break Ok(total_read);
        }

        to.write_all(&buffer[0..bytes_read])?;
        total_read += bytes_read;
        progress(total_read);
    }
}
