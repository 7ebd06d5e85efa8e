use anyhow::{Context, Result, bail};
use log::debug;
use serde::Deserialize;
use std::path::Path;

use super::RawWheel;
use crate::github::ReleaseAsset;
use crate::runtime::Runtime;
use crate::wheel::WHEEL_SUFFIX;

/// Manifest file contents: either a bare asset list or the object printed by
/// `gh release view --json assets`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Wrapped { assets: Vec<ReleaseAsset> },
    Bare(Vec<ReleaseAsset>),
}

/// Reads a release asset manifest from a local JSON file.
#[tracing::instrument(skip(runtime))]
pub fn load_manifest<R: Runtime>(runtime: &R, path: &Path) -> Result<Vec<ReleaseAsset>> {
    let content = runtime.read_to_string(path)?;
    let manifest: ManifestFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse asset manifest {}", path.display()))?;

    Ok(match manifest {
        ManifestFile::Wrapped { assets } => assets,
        ManifestFile::Bare(assets) => assets,
    })
}

/// Selects the wheel assets of a release and pins each download URL to the
/// asset's digest with a `#<algorithm>=<hex>` fragment.
pub fn wheels_from_assets(assets: &[ReleaseAsset]) -> Result<Vec<RawWheel>> {
    let mut wheels = Vec::new();

    for asset in assets {
        if !asset.name.ends_with(WHEEL_SUFFIX) {
            debug!("Ignoring non-wheel asset {}", asset.name);
            continue;
        }

        let Some(digest) = asset.digest.as_deref() else {
            bail!("Release asset '{}' has no digest", asset.name);
        };
        let (algorithm, hash) = parse_digest(digest)
            .with_context(|| format!("Invalid digest for release asset '{}'", asset.name))?;

        let Some(location) = asset.download_url() else {
            bail!("Release asset '{}' has no download URL", asset.name);
        };
        let url = format!("{}#{}={}", location, algorithm, hash);
        wheels.push(RawWheel::new(asset.name.clone(), url));
    }

    debug!(
        "{} of {} release assets are wheels",
        wheels.len(),
        assets.len()
    );
    Ok(wheels)
}

fn parse_digest(digest: &str) -> Result<(&str, &str)> {
    match digest.split_once(':') {
        Some((algorithm, hash))
            if !algorithm.is_empty() && !hash.is_empty() && !hash.contains(':') =>
        {
            Ok((algorithm, hash))
        }
        _ => bail!("expected '<algorithm>:<hex>', got '{}'", digest),
    }
}
