use anyhow::Result;
use log::info;

use crate::{config::PatcherConfig, downloader::Downloader};

/// Filter used to pick the asset to download when an extra file points at a GitHub release.
pub const EXTRA_ASSETS_FILTER: &str = ".*apk";

/// Splits a file name into its stem and extension (including the leading `.`).
/// Only the final `/` separated component can hold the extension, and leading dots of that component
/// are never treated as one, so `.apk` and `..apk` have no extension while `x.` has the extension `.`.
fn split_extension(file_name: &str) -> (&str, &str) {
    let name_start = file_name.rfind('/').map_or(0, |idx| idx + 1);
    let name = &file_name[name_start..];
    let leading_dots = name.len() - name.trim_start_matches('.').len();

    match name.rfind('.') {
        Some(dot) if dot > leading_dots => file_name.split_at(name_start + dot),
        _ => (file_name, ""),
    }
}

/// Downloads each of the extra files given in the config, in order.
/// Entries are in `url@name.apk` format; each is saved as `name-output.apk`.
///
/// Entries without a `.apk` extension are skipped. An entry without an `@` ends processing of the whole list.
/// Errors from the downloader are returned immediately.
pub fn extra_downloads(config: &PatcherConfig, downloader: &impl Downloader) -> Result<()> {
    for extra in &config.extra_download_files {
        let (url, file_name) = match extra.split_once('@') {
            Some(parts) => parts,
            None => {
                info!("Unable to download extra file. Provide input in url@name.apk format.");
                return Ok(());
            }
        };

        let (file_name_without_extension, file_extension) = split_extension(file_name);
        if !file_extension.eq_ignore_ascii_case(".apk") {
            info!("Only .apk extensions are allowed {file_name}.");
            continue;
        }

        let new_file_name = format!("{file_name_without_extension}-output{file_extension}");
        downloader.download(url, config, EXTRA_ASSETS_FILTER, &new_file_name)?;
    }

    Ok(())
}
