//! Minimal client for the GitHub releases API, as used to fetch patch resources and their changelogs.

use std::{collections::HashMap, fmt::Display};

use anyhow::{anyhow, Context, Result};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::default_agent::get_agent;

const API_ROOT: &str = "https://api.github.com";
const WEB_ROOTS: [&str; 2] = ["https://github.com/", "http://github.com/"];

/// Raised when a step of fetching patch resources fails in a way that the patching run cannot recover from.
#[derive(Debug)]
pub struct PatchingFailed(pub String);

impl Display for PatchingFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PatchingFailed {}

/// An HTTP response as far as the GitHub response check is concerned.
pub trait GithubResponse {
    fn status_code(&self) -> u16;

    /// Consumes the response, returning its body as text.
    fn into_text(self) -> String;
}

impl GithubResponse for ureq::Response {
    fn status_code(&self) -> u16 {
        self.status()
    }

    fn into_text(self) -> String {
        match self.into_string() {
            Ok(text) => text,
            Err(err) => format!("<response body could not be read: {err}>"),
        }
    }
}

/// Fails with [PatchingFailed] if the response status is anything other than 200 OK.
/// The response is handed back untouched otherwise.
pub fn handle_github_response<R: GithubResponse>(response: R) -> Result<R, PatchingFailed> {
    if response.status_code() != 200 {
        return Err(PatchingFailed(format!(
            "Unable to download assets from GitHub. Reason - {}",
            response.into_text()
        )));
    }

    Ok(response)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub repo: String,
}

impl Repo {
    /// Parses either `owner/repo` or a github.com repository URL.
    pub fn parse(from: &str) -> Result<Self> {
        if let Some((repo, _)) = parse_release_url(from) {
            return Ok(repo);
        }

        match from.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(anyhow!("Expected a repository in owner/repo format, got {from}")),
        }
    }
}

/// Splits a github.com URL into the repository it points to and, for `/releases/tag/{tag}` URLs, the release tag.
/// Returns None if the URL is not a github.com repository URL.
pub fn parse_release_url(url: &str) -> Option<(Repo, Option<String>)> {
    let path = WEB_ROOTS.iter().find_map(|root| url.strip_prefix(root))?;
    let mut segments = path.trim_end_matches('/').split('/');

    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    let tag = match (segments.next(), segments.next(), segments.next()) {
        (Some("releases"), Some("tag"), Some(tag)) if !tag.is_empty() => Some(tag.to_string()),
        _ => None,
    };

    Some((
        Repo {
            owner: owner.to_string(),
            repo: repo.to_string(),
        },
        tag,
    ))
}

/// A release asset. Does not contain all fields.
#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// The metadata of a GitHub release needed to write a changelog entry and locate its assets.
#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub html_url: String,
    pub body: String,
    pub published_at: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// Builds release metadata from a plain string map.
    /// Every one of `tag_name`, `html_url`, `body` and `published_at` must be present.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let field = |key: &str| {
            map.get(key)
                .cloned()
                .ok_or_else(|| anyhow!("Release metadata had no {key}"))
        };

        Ok(Self {
            tag_name: field("tag_name")?,
            html_url: field("html_url")?,
            body: field("body")?,
            published_at: field("published_at")?,
            assets: Vec::new(),
        })
    }

    /// Finds the first asset with a name matching `filter`.
    pub fn find_asset(&self, filter: &Regex) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| filter.is_match(&asset.name))
    }
}

fn set_headers(req: ureq::Request, auth_token: Option<&str>) -> ureq::Request {
    let req = req
        .set("Accept", "application/vnd.github+json")
        .set("X-GitHub-Api-Version", "2022-11-28");

    match auth_token {
        Some(token) => req.set("Authorization", &format!("Bearer {token}")),
        None => req,
    }
}

fn release_api_url(repo: &Repo, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("{API_ROOT}/repos/{}/{}/releases/tags/{tag}", repo.owner, repo.repo),
        None => format!("{API_ROOT}/repos/{}/{}/releases/latest", repo.owner, repo.repo),
    }
}

/// Passes the outcome of a GitHub API call through [handle_github_response].
/// ureq reports error statuses as errors: these still go through the response check so they fail as [PatchingFailed].
fn checked_response(result: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response> {
    let resp = match result {
        Ok(resp) => resp,
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(err) => return Err(err).context("Failed to GET release from GitHub"),
    };

    Ok(handle_github_response(resp)?)
}

/// Fetches the release with the given tag, or the latest release if no tag is given.
pub fn get_release(repo: &Repo, tag: Option<&str>, auth_token: Option<&str>) -> Result<ReleaseInfo> {
    let req_path = release_api_url(repo, tag);
    debug!("Fetching release from {req_path}");

    let resp = checked_response(set_headers(get_agent().get(&req_path), auth_token).call())?;

    serde_json::from_reader(resp.into_reader()).context("GitHub release response was invalid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeResponse {
        status: u16,
        body: &'static str,
    }

    impl GithubResponse for FakeResponse {
        fn status_code(&self) -> u16 {
            self.status
        }

        fn into_text(self) -> String {
            self.body.to_string()
        }
    }

    #[test]
    fn test_handle_github_response_ok() {
        let resp = handle_github_response(FakeResponse { status: 200, body: "{}" }).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "{}");
    }

    #[test]
    fn test_handle_github_response_error_statuses() {
        for status in [404, 500, 403, 204] {
            let err = handle_github_response(FakeResponse { status, body: "rate limited" }).unwrap_err();
            assert_eq!(err.to_string(), "Unable to download assets from GitHub. Reason - rate limited");
        }
    }

    #[test]
    fn test_handle_github_response_ureq() {
        let not_found = ureq::Response::new(404, "Not Found", r#"{"message":"Not Found"}"#).unwrap();
        let err = handle_github_response(not_found).unwrap_err();
        assert!(err.to_string().contains(r#"{"message":"Not Found"}"#));

        let ok = ureq::Response::new(200, "OK", "[]").unwrap();
        let ok = handle_github_response(ok).unwrap();
        assert_eq!(ok.into_string().unwrap(), "[]");
    }

    #[test]
    fn test_error_status_fails_as_patching_failed() {
        for status in [404, 500] {
            let resp = ureq::Response::new(status, "Error", r#"{"message":"Not Found"}"#).unwrap();
            let err = checked_response(Err(ureq::Error::Status(status, resp))).unwrap_err();

            let patching_failed = err.downcast_ref::<PatchingFailed>().unwrap();
            assert!(patching_failed.0.contains(r#"{"message":"Not Found"}"#));
        }

        let ok = ureq::Response::new(200, "OK", r#"{"tag_name":"v1"}"#).unwrap();
        let ok = checked_response(Ok(ok)).unwrap();
        assert_eq!(ok.into_string().unwrap(), r#"{"tag_name":"v1"}"#);
    }

    #[test]
    fn test_patching_failed_into_anyhow() {
        fn check() -> Result<()> {
            handle_github_response(FakeResponse { status: 500, body: "oops" })?;
            Ok(())
        }

        let err = check().unwrap_err();
        assert!(err.downcast_ref::<PatchingFailed>().is_some());
    }

    #[test]
    fn test_parse_release_url() {
        let (repo, tag) = parse_release_url("https://github.com/revanced/revanced-patches/releases/latest").unwrap();
        assert_eq!(repo, Repo { owner: "revanced".to_string(), repo: "revanced-patches".to_string() });
        assert_eq!(tag, None);

        let (repo, tag) = parse_release_url("https://github.com/inotia00/VancedMicroG/releases/tag/v0.2.24.220220/").unwrap();
        assert_eq!(repo.owner, "inotia00");
        assert_eq!(repo.repo, "VancedMicroG");
        assert_eq!(tag.as_deref(), Some("v0.2.24.220220"));

        let (_, tag) = parse_release_url("https://github.com/owner/repo").unwrap();
        assert_eq!(tag, None);

        assert!(parse_release_url("https://example.com/owner/repo").is_none());
        assert!(parse_release_url("https://github.com/owner").is_none());
        assert!(parse_release_url("http://a/b.apk").is_none());
    }

    #[test]
    fn test_repo_parse() {
        let repo = Repo::parse("revanced/revanced-cli").unwrap();
        assert_eq!(repo.owner, "revanced");
        assert_eq!(repo.repo, "revanced-cli");

        let repo = Repo::parse("https://github.com/revanced/revanced-cli/releases").unwrap();
        assert_eq!(repo.repo, "revanced-cli");

        assert!(Repo::parse("revanced").is_err());
        assert!(Repo::parse("/revanced").is_err());
        assert!(Repo::parse("a/b/c").is_err());
    }

    #[test]
    fn test_release_api_url() {
        let repo = Repo { owner: "o".to_string(), repo: "r".to_string() };
        assert_eq!(release_api_url(&repo, None), "https://api.github.com/repos/o/r/releases/latest");
        assert_eq!(release_api_url(&repo, Some("v1")), "https://api.github.com/repos/o/r/releases/tags/v1");
    }

    #[test]
    fn test_release_info_from_map() {
        let map: HashMap<String, String> = [
            ("tag_name", "v1"),
            ("html_url", "http://x"),
            ("body", "fix"),
            ("published_at", "2024-01-01"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let release = ReleaseInfo::from_map(&map).unwrap();
        assert_eq!(release.tag_name, "v1");
        assert_eq!(release.published_at, "2024-01-01");

        let mut missing = map.clone();
        missing.remove("body");
        let err = ReleaseInfo::from_map(&missing).unwrap_err();
        assert!(err.to_string().contains("body"));
    }

    #[test]
    fn test_release_info_from_json() {
        let json = r#"{
            "tag_name": "v4.0.0",
            "html_url": "https://github.com/o/r/releases/tag/v4.0.0",
            "body": "* fixes",
            "published_at": "2024-03-01T10:00:00Z",
            "draft": false,
            "assets": [
                { "name": "patches.jar", "browser_download_url": "https://dl/patches.jar", "size": 10 },
                { "name": "integrations.apk", "browser_download_url": "https://dl/integrations.apk", "size": 20 }
            ]
        }"#;

        let release: ReleaseInfo = serde_json::from_str(json).unwrap();
        let apk = release.find_asset(&Regex::new(".*apk").unwrap()).unwrap();
        assert_eq!(apk.browser_download_url, "https://dl/integrations.apk");
        assert!(release.find_asset(&Regex::new(r"\.zip$").unwrap()).is_none());

        let missing_tag = r#"{ "html_url": "x", "body": "y", "published_at": "z" }"#;
        assert!(serde_json::from_str::<ReleaseInfo>(missing_tag).is_err());
    }
}
