//! Support utilities for the patchbot APK patching pipeline: changelog generation,
//! GitHub release lookups, extra file downloads and the Java runtime check.

pub mod changelog;
pub mod config;
pub mod default_agent;
pub mod downloader;
pub mod extra_downloads;
pub mod github;
pub mod java;
pub mod slug;

pub use changelog::{update_changelog, Changelog};
pub use config::PatcherConfig;
pub use downloader::{Downloader, HttpDownloader};
pub use extra_downloads::extra_downloads;
pub use github::{handle_github_response, PatchingFailed, ReleaseInfo};
pub use java::{check_java, ensure_java, JavaStatus};
pub use slug::slugify;
