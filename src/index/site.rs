use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::{IndexEntry, IndexTree, render_page};
use crate::runtime::Runtime;
use crate::upstream::VariantOverlay;
use crate::wheel::VariantKey;

const SIMPLE_DIR: &str = "simple";
const INDEX_FILE: &str = "index.html";

/// Rendered pages keyed by their path relative to the output directory.
pub type SitePages = BTreeMap<PathBuf, String>;

/// Lays out every page of the index:
///
/// ```text
/// simple/index.html                      global package list
/// simple/<package>/index.html            global package page
/// <variant>/simple/index.html            variant package list
/// <variant>/simple/<package>/index.html  variant package page
/// ```
///
/// An overlay page replaces the locally aggregated page of the same package in
/// its variant, and its links replace the local ones on the global page.
pub fn plan_pages(tree: &IndexTree, overlays: &BTreeMap<VariantKey, VariantOverlay>) -> SitePages {
    let mut pages = SitePages::new();
    let no_overlay = VariantOverlay::new();

    let variants: BTreeSet<VariantKey> = tree.variants().chain(overlays.keys().copied()).collect();
    for variant in variants {
        let root = Path::new(&variant.to_string()).join(SIMPLE_DIR);
        let overlay = overlays.get(&variant).unwrap_or(&no_overlay);
        let mut listing = BTreeSet::new();

        for (package, entries) in tree.packages(variant).into_iter().flatten() {
            listing.insert(IndexEntry::directory(package.as_str()));
            if overlay.contains_key(package) {
                debug!("Upstream page replaces local {} in {}", package, variant);
                continue;
            }
            pages.insert(root.join(package).join(INDEX_FILE), render_page(entries));
        }

        for (package, page) in overlay {
            listing.insert(IndexEntry::directory(package.as_str()));
            pages.insert(root.join(package).join(INDEX_FILE), page.html.clone());
        }

        pages.insert(root.join(INDEX_FILE), render_page(&listing));
    }

    let overlaid: BTreeSet<&str> = overlays
        .values()
        .flat_map(|overlay| overlay.keys().map(String::as_str))
        .collect();

    let mut global: BTreeMap<&str, BTreeSet<&IndexEntry>> = BTreeMap::new();
    for (package, entries) in tree.global() {
        if !overlaid.contains(package.as_str()) {
            global.entry(package.as_str()).or_default().extend(entries);
        }
    }
    for (package, page) in overlays.values().flatten() {
        if !tree.is_reserved(package) {
            global.entry(package.as_str()).or_default().extend(&page.entries);
        }
    }

    let root = Path::new(SIMPLE_DIR);
    let listing: Vec<IndexEntry> = global.keys().map(|p| IndexEntry::directory(*p)).collect();
    pages.insert(root.join(INDEX_FILE), render_page(&listing));
    for (package, entries) in global {
        pages.insert(root.join(package).join(INDEX_FILE), render_page(entries));
    }

    pages
}

/// Removes a previous output tree. The index is always rebuilt from scratch.
#[tracing::instrument(skip(runtime))]
pub fn reset_output_dir<R: Runtime>(runtime: &R, output_dir: &Path) -> Result<()> {
    if runtime.exists(output_dir) {
        info!("Removing previous index at {}", output_dir.display());
        runtime.remove_dir_all(output_dir)?;
    }
    Ok(())
}

/// Writes pages under `output_dir`, creating parent directories as needed.
#[tracing::instrument(skip(runtime, pages))]
pub fn write_pages<R: Runtime>(runtime: &R, output_dir: &Path, pages: &SitePages) -> Result<()> {
    for (relative, html) in pages {
        let path = output_dir.join(relative);
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        runtime
            .write(&path, html.as_bytes())
            .with_context(|| format!("Failed to write index page {}", path.display()))?;
    }

    info!("Wrote {} pages to {}", pages.len(), output_dir.display());
    Ok(())
}
