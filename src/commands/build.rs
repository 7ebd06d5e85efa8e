use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use super::config::Config;
use crate::{
    github::{GetReleases, GitHubRepo, ReleaseAsset},
    index::{aggregate, plan_pages, reset_output_dir, write_pages},
    runtime::Runtime,
    source::{RawWheel, discover_url_sources, load_manifest, wheels_from_assets},
    upstream::{OverlayConfig, UpstreamIndex, overlay},
};

/// Where the release asset manifest comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestSource {
    /// Fetched from the GitHub release published under `tag`.
    Release { repo: GitHubRepo, tag: String },
    /// Read from a local JSON file.
    File(PathBuf),
}

/// Inputs of one index build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub manifest: ManifestSource,
    /// `None` disables the upstream overlay.
    pub overlay: Option<OverlayConfig>,
    /// Package names kept out of the global index.
    pub reserved_packages: BTreeSet<String>,
}

/// What a build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub variants: usize,
    pub packages: usize,
    pub pages: usize,
    pub skipped: usize,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Indexed {} packages across {} variants ({} pages written, {} wheels skipped)",
            self.packages, self.variants, self.pages, self.skipped
        )
    }
}

#[tracing::instrument(skip(runtime, options, api_url))]
pub async fn build<R: Runtime>(
    runtime: R,
    options: BuildOptions,
    api_url: Option<String>,
) -> Result<()> {
    let config = Config::new(runtime, api_url)?;
    let summary = run(config, &options).await?;
    println!("{}", summary);
    println!("Index written to {}", options.output_dir.display());
    Ok(())
}

/// Builds the whole index: read both sources, aggregate, overlay upstream
/// pages, then render and write every page.
#[tracing::instrument(skip(config, options))]
pub async fn run<R: Runtime, G: GetReleases, U: UpstreamIndex>(
    config: Config<R, G, U>,
    options: &BuildOptions,
) -> Result<BuildSummary> {
    let runtime = &config.runtime;

    reset_output_dir(runtime, &options.output_dir)?;

    let assets = fetch_assets(&config, &options.manifest).await?;
    let asset_wheels = wheels_from_assets(&assets)?;

    let mut url_wheels: Vec<RawWheel> = Vec::new();
    for source in discover_url_sources(runtime, &options.input_dir)? {
        url_wheels.extend(source.read_wheels(runtime)?);
    }

    info!(
        "Aggregating {} release wheels and {} listed wheels",
        asset_wheels.len(),
        url_wheels.len()
    );
    let tree = aggregate(asset_wheels, url_wheels, options.reserved_packages.iter().cloned());

    let mut overlays = BTreeMap::new();
    if let Some(overlay_config) = &options.overlay {
        for variant in tree.variants() {
            let pages = overlay(&config.upstream, variant, overlay_config).await?;
            overlays.insert(variant, pages);
        }
    } else {
        debug!("Upstream overlay disabled");
    }

    let pages = plan_pages(&tree, &overlays);
    write_pages(runtime, &options.output_dir, &pages)?;

    let packages = pages
        .keys()
        .filter(|path| path.starts_with("simple") && path.components().count() == 3)
        .count();

    Ok(BuildSummary {
        variants: tree.variants().count(),
        packages,
        pages: pages.len(),
        skipped: tree.skipped().len(),
    })
}

async fn fetch_assets<R: Runtime, G: GetReleases, U: UpstreamIndex>(
    config: &Config<R, G, U>,
    manifest: &ManifestSource,
) -> Result<Vec<ReleaseAsset>> {
    match manifest {
        ManifestSource::Release { repo, tag } => {
            info!(
                "Reading assets of release {} of {} from {}",
                tag,
                repo,
                config.github.api_url()
            );
            let release = config.github.get_release_by_tag(repo, tag).await?;
            Ok(release.assets)
        }
        ManifestSource::File(path) => {
            info!("Reading assets from {}", path.display());
            load_manifest(&config.runtime, path)
                .with_context(|| format!("Failed to load asset manifest {}", path.display()))
        }
    }
}
