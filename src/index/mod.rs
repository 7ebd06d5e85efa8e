//! PEP 503 index assembly.
//!
//! `tree` merges wheels from every source into per-variant and global package
//! sets, `render` turns a set of entries into an HTML page, and `site` lays
//! the pages out on disk.

mod render;
mod site;
mod tree;

pub use render::{HTML_TEMPLATE, render_page};
pub use site::{SitePages, plan_pages, reset_output_dir, write_pages};
pub use tree::{IndexTree, PackageSets, SkipReason, SkippedWheel, aggregate};

use std::borrow::Cow;

/// One anchor in an index page.
///
/// Entries order by `(name, url)`; an entry without a URL links to the
/// sub-directory named after it and sorts before any concrete URL of the
/// same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexEntry {
    pub name: String,
    pub url: Option<String>,
}

impl IndexEntry {
    /// An entry pointing at the `<name>/` sub-index.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    /// An entry pointing at a concrete file.
    pub fn link(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    pub fn href(&self) -> Cow<'_, str> {
        match &self.url {
            Some(url) => Cow::Borrowed(url),
            None => Cow::Owned(format!("{}/", self.name)),
        }
    }
}
