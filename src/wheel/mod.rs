//! Wheel artifacts: filename parsing, descriptors and variant classification.

mod variant;

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub use variant::{ClassifyError, VariantKey, classify};

/// File suffix shared by every wheel artifact.
pub const WHEEL_SUFFIX: &str = ".whl";

// Project names start and end alphanumeric and never contain `-` or `/`,
// so they are safe as a single index path segment.
static WHEEL_FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<project>[A-Za-z0-9](?:[A-Za-z0-9._]*[A-Za-z0-9])?)",
        r"-(?P<version>[A-Za-z0-9_.!+]+)",
        r"(?:-(?P<build>[0-9][A-Za-z0-9_.]*))?",
        r"-(?P<python>[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)",
        r"-(?P<abi>[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)",
        r"-(?P<platform>[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)",
        r"\.whl$",
    ))
    .unwrap()
});

/// Error returned when a filename is not a well-formed wheel filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelNameError(pub String);

impl fmt::Display for WheelNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid wheel filename: '{}'", self.0)
    }
}

impl std::error::Error for WheelNameError {}

/// The fields encoded in a wheel filename.
///
/// `{project}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    pub project: String,
    pub version: String,
    pub build: Option<String>,
    pub python: String,
    pub abi: String,
    pub platform: String,
}

impl WheelFilename {
    /// The version with any local version tag (`+...`) removed.
    pub fn base_version(&self) -> &str {
        self.version
            .split_once('+')
            .map_or(self.version.as_str(), |(base, _)| base)
    }

    /// Project name as it appears in index paths.
    pub fn package_name(&self) -> String {
        normalize_package_name(&self.project)
    }
}

impl FromStr for WheelFilename {
    type Err = WheelNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = WHEEL_FILENAME_RE
            .captures(s)
            .ok_or_else(|| WheelNameError(s.to_string()))?;

        Ok(WheelFilename {
            project: caps["project"].to_string(),
            version: caps["version"].to_string(),
            build: caps.name("build").map(|m| m.as_str().to_string()),
            python: caps["python"].to_string(),
            abi: caps["abi"].to_string(),
            platform: caps["platform"].to_string(),
        })
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project, self.version)?;
        if let Some(build) = &self.build {
            write!(f, "-{}", build)?;
        }
        write!(
            f,
            "-{}-{}-{}{}",
            self.python, self.abi, self.platform, WHEEL_SUFFIX
        )
    }
}

/// Index directory name for a project: underscores become hyphens.
pub fn normalize_package_name(project: &str) -> String {
    project.replace('_', "-")
}

/// A wheel as it will appear in an index: which package it belongs to, the
/// label shown for it and where it can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WheelDescriptor {
    pub package_name: String,
    pub filename: String,
    pub url: String,
}

impl WheelDescriptor {
    /// Builds a descriptor from a parsed filename and its download location.
    pub fn new(wheel: &WheelFilename, filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            package_name: wheel.package_name(),
            filename: filename.into(),
            url: url.into(),
        }
    }
}
