//! GitHub release manifest retrieval.

mod client;
mod repo;
mod types;

pub use client::{GetReleases, GitHub};
#[cfg(test)]
pub use client::MockGetReleases;
pub use repo::GitHubRepo;
pub use types::{Release, ReleaseAsset};

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
