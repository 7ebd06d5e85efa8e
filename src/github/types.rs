use serde::{Deserialize, Serialize};

/// Represents a GitHub release asset.
///
/// The REST API sends both `url` (the API resource) and
/// `browser_download_url` (the file itself). `gh release view --json assets`
/// only sends `url`, and there it is the download link.
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub browser_download_url: Option<String>,
    /// Content hash in `<algorithm>:<hex>` form.
    #[serde(default)]
    pub digest: Option<String>,
}

impl ReleaseAsset {
    /// Where the asset file can be downloaded from.
    pub fn download_url(&self) -> Option<&str> {
        self.browser_download_url.as_deref().or(self.url.as_deref())
    }
}

/// Represents a GitHub release
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}
