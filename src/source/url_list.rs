use anyhow::{Context, Result};
use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use url::Url;

use super::RawWheel;
use crate::runtime::Runtime;
use crate::wheel::VariantKey;

/// File name of a URL list in the nested layout.
pub const URLS_FILE_NAME: &str = "urls.txt";

const FLAT_EXTENSION: &str = "txt";

/// A per-variant list of wheel URLs.
pub trait UrlSource {
    /// Variant every URL of this source belongs to.
    fn variant(&self) -> VariantKey;

    /// The file the URLs are read from.
    fn path(&self) -> &Path;

    /// Reads the source into raw wheels filed under [`UrlSource::variant`].
    fn read_wheels(&self, runtime: &dyn Runtime) -> Result<Vec<RawWheel>> {
        let path = self.path();
        let content = runtime.read_to_string(path)?;

        let mut wheels = Vec::new();
        for url in parse_url_lines(&content) {
            let filename = filename_from_url(url)
                .with_context(|| format!("Invalid URL in {}", path.display()))?;
            wheels.push(RawWheel::new(filename, url).in_variant(self.variant()));
        }

        debug!(
            "Read {} URLs for {} from {}",
            wheels.len(),
            self.variant(),
            path.display()
        );
        Ok(wheels)
    }
}

/// Current layout: `<input>/<variant>.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatUrlFile {
    pub variant: VariantKey,
    pub path: PathBuf,
}

impl UrlSource for FlatUrlFile {
    fn variant(&self) -> VariantKey {
        self.variant
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Legacy layout: `<input>/<variant>/urls.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedUrlFile {
    pub variant: VariantKey,
    pub dir: PathBuf,
    path: PathBuf,
}

impl NestedUrlFile {
    pub fn new(variant: VariantKey, dir: PathBuf) -> Self {
        let path = dir.join(URLS_FILE_NAME);
        Self { variant, dir, path }
    }
}

impl UrlSource for NestedUrlFile {
    fn variant(&self) -> VariantKey {
        self.variant
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Finds every URL list under `input_dir`, accepting both layouts.
///
/// A missing input directory yields no sources. Entries whose name is not a
/// variant key are skipped with a warning.
#[tracing::instrument(skip(runtime))]
pub fn discover_url_sources<R: Runtime>(
    runtime: &R,
    input_dir: &Path,
) -> Result<Vec<Box<dyn UrlSource>>> {
    let mut sources: Vec<Box<dyn UrlSource>> = Vec::new();

    if !runtime.exists(input_dir) {
        info!(
            "Input directory {} does not exist, no URL lists to read",
            input_dir.display()
        );
        return Ok(sources);
    }

    for entry in runtime.read_dir(input_dir)? {
        if runtime.is_dir(&entry) {
            if !runtime.exists(&entry.join(URLS_FILE_NAME)) {
                debug!("Skipping {}: no {}", entry.display(), URLS_FILE_NAME);
                continue;
            }
            if let Some(variant) = variant_from_name(&entry, entry.file_name()) {
                sources.push(Box::new(NestedUrlFile::new(variant, entry)));
            }
        } else if entry.extension().is_some_and(|ext| ext == FLAT_EXTENSION) {
            if let Some(variant) = variant_from_name(&entry, entry.file_stem()) {
                sources.push(Box::new(FlatUrlFile {
                    variant,
                    path: entry,
                }));
            }
        } else {
            debug!("Skipping {}: not a URL list", entry.display());
        }
    }

    info!(
        "Found {} URL lists in {}",
        sources.len(),
        input_dir.display()
    );
    Ok(sources)
}

fn variant_from_name(entry: &Path, name: Option<&std::ffi::OsStr>) -> Option<VariantKey> {
    let name = name?.to_string_lossy();
    match name.parse::<VariantKey>() {
        Ok(variant) => Some(variant),
        Err(e) => {
            warn!("Skipping URL list {}: {}", entry.display(), e);
            None
        }
    }
}

/// Yields the URLs of a list, skipping blank lines and `#` comments.
pub fn parse_url_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// The percent-decoded last path segment of a URL.
pub fn filename_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("Failed to parse URL '{}'", url))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .with_context(|| format!("URL '{}' has no file name", url))?;

    let filename = percent_decode_str(segment)
        .decode_utf8()
        .with_context(|| format!("URL '{}' has a file name that is not UTF-8", url))?;
    Ok(filename.into_owned())
}
