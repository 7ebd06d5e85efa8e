//! Readers that turn external inputs into raw wheel records.
//!
//! - `assets` - release asset manifests (GitHub API or a local JSON file)
//! - `url_list` - newline-delimited URL lists, one per variant, in either the
//!   flat (`<variant>.txt`) or nested (`<variant>/urls.txt`) layout

mod assets;
mod url_list;

pub use assets::{load_manifest, wheels_from_assets};
pub use url_list::{
    FlatUrlFile, NestedUrlFile, URLS_FILE_NAME, UrlSource, discover_url_sources, filename_from_url,
    parse_url_lines,
};

use crate::wheel::VariantKey;

/// A wheel as reported by a source, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWheel {
    pub filename: String,
    pub url: String,
    /// Variant the source files this wheel under, if the source is per-variant.
    pub declared_variant: Option<VariantKey>,
}

impl RawWheel {
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
            declared_variant: None,
        }
    }

    pub fn in_variant(mut self, variant: VariantKey) -> Self {
        self.declared_variant = Some(variant);
        self
    }
}
