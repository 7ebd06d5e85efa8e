//! Variant keys and the classifier that derives them from wheel versions.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// {base}+cu{cuda}.torch{torch}, anchored on both ends
static LOCAL_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+\+cu(\d+)\.torch(\d+)$").unwrap());

static VARIANT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cu(\d+)_torch(\d+)$").unwrap());

/// A CUDA + Torch build target, rendered as `cu<CUDA>_torch<TORCH>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub cuda: u32,
    pub torch: u32,
}

impl VariantKey {
    pub fn new(cuda: u32, torch: u32) -> Self {
        Self { cuda, torch }
    }

    /// The local version tag wheels of this variant carry, e.g. `cu128.torch27`.
    pub fn local_version(&self) -> String {
        format!("cu{}.torch{}", self.cuda, self.torch)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cu{}_torch{}", self.cuda, self.torch)
    }
}

impl FromStr for VariantKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VARIANT_KEY_RE
            .captures(s)
            .and_then(|caps| Some(VariantKey::new(caps[1].parse().ok()?, caps[2].parse().ok()?)))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid variant name '{}'. Expected 'cu<CUDA>_torch<TORCH>', e.g. 'cu128_torch27'.",
                    s
                )
            })
    }
}

/// Why a wheel version could not be mapped to a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// The version has no `+cuN.torchM` local tag, or the tag is malformed.
    InvalidLocalVersion(String),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::InvalidLocalVersion(version) => write!(
                f,
                "version '{}' does not match '<version>+cu<CUDA>.torch<TORCH>'",
                version
            ),
        }
    }
}

impl std::error::Error for ClassifyError {}

/// Maps a full wheel version such as `2.5.0+cu128.torch27` to its variant.
pub fn classify(version: &str) -> Result<VariantKey, ClassifyError> {
    let rejected = || ClassifyError::InvalidLocalVersion(version.to_string());

    let caps = LOCAL_VERSION_RE.captures(version).ok_or_else(rejected)?;
    let cuda = caps[1].parse().map_err(|_| rejected())?;
    let torch = caps[2].parse().map_err(|_| rejected())?;
    Ok(VariantKey::new(cuda, torch))
}
