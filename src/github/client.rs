use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::DEFAULT_API_URL;
use super::repo::GitHubRepo;
use super::types::Release;
use crate::http::HttpClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GetReleases: Send + Sync {
    /// Fetch the release published under `tag`, including its asset manifest.
    async fn get_release_by_tag(&self, repo: &GitHubRepo, tag: &str) -> Result<Release>;
    fn api_url(&self) -> &str;
}

pub struct GitHub {
    pub client: HttpClient,
    pub api_url: String,
}

impl GitHub {
    #[tracing::instrument(skip(client, api_url))]
    pub fn new(client: HttpClient, api_url: Option<String>) -> Self {
        let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self { client, api_url }
    }
}

#[async_trait]
impl GetReleases for GitHub {
    #[tracing::instrument(skip(self, repo))]
    async fn get_release_by_tag(&self, repo: &GitHubRepo, tag: &str) -> Result<Release> {
        let url = format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.api_url.trim_end_matches('/'),
            repo.owner,
            repo.repo,
            tag
        );

        debug!("Fetching release {} of {} from {}...", tag, repo, url);

        let release: Release = self
            .client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch release '{}' of {}", tag, repo))?;

        debug!(
            "Release {} has {} assets",
            release.tag_name,
            release.assets.len()
        );

        Ok(release)
    }

    #[tracing::instrument(skip(self))]
    fn api_url(&self) -> &str {
        &self.api_url
    }
}
