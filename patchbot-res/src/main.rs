use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use patchbot_res::{
    config::{parse_extra_files, PatcherConfig},
    github::{self, Repo},
    HttpDownloader,
};

#[derive(Parser)]
#[command(version, long_about = None)]
#[command(arg_required_else_help = true)]
#[command(about = "Support tooling for the patchbot APK patching pipeline")]
struct Cli {
    /// JSON config file. Settings given as flags or environment variables take priority.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Skips downloads and the Java check.
    #[arg(long, global = true, env = "DRY_RUN")]
    dry_run: bool,
    /// Comma separated list of extra files to download, each in url@name.apk format.
    #[arg(long, global = true, env = "EXTRA_FILES")]
    extra_files: Option<String>,
    /// Token used for GitHub API requests.
    #[arg(long, global = true, env = "PERSONAL_ACCESS_TOKEN", hide_env_values = true)]
    github_token: Option<String>,
    /// Enables debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exits with an error unless Java 17 or 20 is installed.
    CheckJava,
    /// Prints the slug of the given text.
    Slugify {
        text: String,
    },
    /// Appends the notes of a GitHub release to the changelog.
    Changelog {
        /// Repository in owner/repo format, or its github.com URL.
        #[arg(short, long)]
        repo: String,
        /// Release tag. Defaults to the latest release.
        #[arg(short, long)]
        tag: Option<String>,
        /// Name shown in the changelog entry. Defaults to the repository name.
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Downloads the configured extra APK files into the temp folder.
    ExtraDownloads,
}

impl Cli {
    fn load_config(&self) -> Result<PatcherConfig> {
        let mut config = PatcherConfig::load_or_default(self.config.as_deref())
            .context("Failed to load config")?;

        if self.dry_run {
            config.dry_run = true;
        }
        if let Some(extra_files) = &self.extra_files {
            config.extra_download_files = parse_extra_files(extra_files);
        }
        if let Some(token) = &self.github_token {
            config.github_token = Some(token.clone());
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .format_target(false)
        .format_timestamp(None)
        .init();

    let config = cli.load_config()?;
    match cli.command {
        Commands::CheckJava => patchbot_res::ensure_java(config.dry_run),
        Commands::Slugify { text } => println!("{}", patchbot_res::slugify(&text)),
        Commands::Changelog { repo, tag, name } => {
            let repo = Repo::parse(&repo)?;
            let release = github::get_release(&repo, tag.as_deref(), config.github_token.as_deref())
                .context("Failed to fetch release")?;

            let name = name.unwrap_or_else(|| repo.repo.clone());
            info!("Adding {name} {} to {:?}", release.tag_name, config.changelog_path);
            patchbot_res::update_changelog(&config.changelog_path, &name, &release)?;
        }
        Commands::ExtraDownloads => patchbot_res::extra_downloads(&config, &HttpDownloader)?,
    }

    Ok(())
}
