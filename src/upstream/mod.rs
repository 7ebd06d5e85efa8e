//! Upstream overlay: package pages mirrored verbatim from a third-party index.
//!
//! For an allow-listed package, a variant's detail page is the upstream
//! simple-index page for that package rather than anything aggregated
//! locally. Fetching (and link rewriting) is delegated to an
//! [`UpstreamIndex`]; this module only sanitizes and collects the pages.

mod client;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

pub use client::{HttpUpstream, absolutize_links, package_page_url};

use crate::index::IndexEntry;
use crate::wheel::VariantKey;

/// Default upstream index: the PyTorch wheel index.
pub const DEFAULT_UPSTREAM_URL: &str = "https://download.pytorch.org/whl";

/// Packages mirrored from the upstream index unless configured otherwise.
pub const DEFAULT_UPSTREAM_PACKAGES: [&str; 3] = ["torch", "torchvision", "torchaudio"];

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>([^<]*)</a>"#).unwrap()
});

/// Which packages are taken from the upstream index, and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    pub names: BTreeSet<String>,
    pub base_url: String,
}

impl OverlayConfig {
    pub fn new<I, S>(names: I, base_url: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            base_url: base_url.into(),
        }
    }

    pub fn contains(&self, package: &str) -> bool {
        self.names.contains(package)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UPSTREAM_PACKAGES, DEFAULT_UPSTREAM_URL)
    }
}

/// Source of upstream simple-index pages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamIndex: Send + Sync {
    /// Fetch the page for `package` in `variant` under `base_url`, with every
    /// relative link already rewritten to an absolute URL.
    async fn fetch_package_page(
        &self,
        base_url: &str,
        variant: VariantKey,
        package: &str,
    ) -> Result<String>;
}

/// A sanitized upstream page and the links found on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPage {
    pub html: String,
    pub entries: BTreeSet<IndexEntry>,
}

impl OverlayPage {
    pub fn from_upstream(html: &str) -> Self {
        let html = sanitize(html);
        let entries = extract_links(&html);
        Self { html, entries }
    }
}

/// Overlay pages of one variant, by package name.
pub type VariantOverlay = BTreeMap<String, OverlayPage>;

/// Fetches and sanitizes the upstream page of every configured package for
/// `variant`. Any fetch failure aborts.
#[tracing::instrument(skip(upstream, config))]
pub async fn overlay<U: UpstreamIndex + ?Sized>(
    upstream: &U,
    variant: VariantKey,
    config: &OverlayConfig,
) -> Result<VariantOverlay> {
    let mut pages = VariantOverlay::new();

    for package in &config.names {
        debug!("Fetching upstream page of {} for {}", package, variant);
        let html = upstream
            .fetch_package_page(&config.base_url, variant, package)
            .await
            .with_context(|| {
                format!(
                    "Failed to fetch upstream index of {} for {}",
                    package, variant
                )
            })?;
        pages.insert(package.clone(), OverlayPage::from_upstream(&html));
    }

    info!(
        "Mirrored {} upstream packages for {}",
        pages.len(),
        variant
    );
    Ok(pages)
}

/// Drops blank lines and HTML comment lines so regenerated pages only differ
/// when the upstream links do. Every other line is kept as it was served.
pub fn sanitize(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for line in html.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("<!--") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Collects the anchors of a page as `(label, href)` entries.
pub fn extract_links(html: &str) -> BTreeSet<IndexEntry> {
    ANCHOR_RE
        .captures_iter(html)
        .map(|caps| IndexEntry::link(caps[2].trim(), &caps[1]))
        .collect()
}
