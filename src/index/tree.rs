use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::IndexEntry;
use crate::source::RawWheel;
use crate::wheel::{ClassifyError, VariantKey, WheelDescriptor, WheelFilename, WheelNameError, classify};

/// Why a wheel was left out of every index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidFilename(WheelNameError),
    InvalidVersion(ClassifyError),
    /// A URL list filed the wheel under a variant its own version disagrees with.
    VariantMismatch {
        declared: VariantKey,
        found: VariantKey,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidFilename(e) => write!(f, "{}", e),
            SkipReason::InvalidVersion(e) => write!(f, "{}", e),
            SkipReason::VariantMismatch { declared, found } => write!(
                f,
                "listed under {} but built for {}",
                declared, found
            ),
        }
    }
}

/// A wheel that could not be placed in any index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedWheel {
    pub filename: String,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedWheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Skipping invalid wheel {}: {}", self.filename, self.reason)
    }
}

pub type PackageSets = BTreeMap<String, BTreeSet<IndexEntry>>;

/// Wheels grouped by variant and package, plus the variant-agnostic union.
///
/// Every entry reachable through a variant is also reachable through the
/// global package set of the same name, except for reserved package names,
/// which never enter the global set.
#[derive(Debug, Default)]
pub struct IndexTree {
    variants: BTreeMap<VariantKey, PackageSets>,
    global: PackageSets,
    reserved: BTreeSet<String>,
    skipped: Vec<SkippedWheel>,
}

impl IndexTree {
    /// Creates an empty tree that keeps `reserved` package names out of the
    /// global index.
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Classifies a raw wheel and inserts it, or records why it was skipped.
    ///
    /// Wheels read from a per-variant URL list stay in that list's variant;
    /// their version tag is only checked for contradictions.
    pub fn add(&mut self, raw: RawWheel) -> Result<VariantKey, SkippedWheel> {
        let placed = Self::place(&raw);
        match placed {
            Ok((variant, descriptor)) => {
                self.insert(variant, descriptor);
                Ok(variant)
            }
            Err(reason) => {
                let skipped = SkippedWheel {
                    filename: raw.filename,
                    reason,
                };
                warn!("{}", skipped);
                self.skipped.push(skipped.clone());
                Err(skipped)
            }
        }
    }

    fn place(raw: &RawWheel) -> Result<(VariantKey, WheelDescriptor), SkipReason> {
        let wheel: WheelFilename = raw.filename.parse().map_err(SkipReason::InvalidFilename)?;
        let classified = classify(&wheel.version);

        let variant = match (raw.declared_variant, classified) {
            (Some(declared), Ok(found)) if declared != found => {
                return Err(SkipReason::VariantMismatch { declared, found });
            }
            (Some(declared), _) => declared,
            (None, Ok(found)) => found,
            (None, Err(e)) => return Err(SkipReason::InvalidVersion(e)),
        };

        Ok((
            variant,
            WheelDescriptor::new(&wheel, raw.filename.as_str(), raw.url.as_str()),
        ))
    }

    /// Inserts a descriptor under `variant`. Returns false if the same
    /// `(filename, url)` pair was already present.
    pub fn insert(&mut self, variant: VariantKey, descriptor: WheelDescriptor) -> bool {
        let entry = IndexEntry::link(descriptor.filename, descriptor.url);

        if !self.reserved.contains(&descriptor.package_name) {
            self.global
                .entry(descriptor.package_name.clone())
                .or_default()
                .insert(entry.clone());
        }

        let inserted = self
            .variants
            .entry(variant)
            .or_default()
            .entry(descriptor.package_name)
            .or_default()
            .insert(entry);

        if !inserted {
            debug!("Duplicate wheel entry in {} ignored", variant);
        }
        inserted
    }

    pub fn variants(&self) -> impl Iterator<Item = VariantKey> + '_ {
        self.variants.keys().copied()
    }

    /// Package sets of one variant.
    pub fn packages(&self, variant: VariantKey) -> Option<&PackageSets> {
        self.variants.get(&variant)
    }

    /// Package sets across all variants, without reserved names.
    pub fn global(&self) -> &PackageSets {
        &self.global
    }

    pub fn is_reserved(&self, package: &str) -> bool {
        self.reserved.contains(package)
    }

    pub fn skipped(&self) -> &[SkippedWheel] {
        &self.skipped
    }
}

/// Builds the index tree from release assets and URL list wheels.
pub fn aggregate<I, S>(
    asset_wheels: impl IntoIterator<Item = RawWheel>,
    url_list_wheels: impl IntoIterator<Item = RawWheel>,
    reserved: I,
) -> IndexTree
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tree = IndexTree::new(reserved);
    for raw in asset_wheels.into_iter().chain(url_list_wheels) {
        // Skips are recorded on the tree
        let _ = tree.add(raw);
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_RESERVED: [&str; 0] = [];

    fn asset(filename: &str) -> RawWheel {
        RawWheel::new(filename, format!("https://gh/{}#sha256=abc", filename))
    }

    fn listed(filename: &str, variant: &str) -> RawWheel {
        RawWheel::new(filename, format!("https://mirror/{}", filename))
            .in_variant(variant.parse().unwrap())
    }

    #[test]
    fn test_assets_are_classified_by_local_version() {
        let tree = aggregate(
            vec![
                asset("mypkg-1.0+cu128.torch27-py3-none-any.whl"),
                asset("my_pkg2-0.3+cu121.torch25-cp310-cp310-linux_x86_64.whl"),
            ],
            vec![],
            NO_RESERVED,
        );

        let variants: Vec<String> = tree.variants().map(|v| v.to_string()).collect();
        assert_eq!(variants, ["cu121_torch25", "cu128_torch27"]);

        let cu128 = tree.packages(VariantKey::new(128, 27)).unwrap();
        assert_eq!(cu128.keys().collect::<Vec<_>>(), ["mypkg"]);

        let cu121 = tree.packages(VariantKey::new(121, 25)).unwrap();
        assert_eq!(cu121.keys().collect::<Vec<_>>(), ["my-pkg2"]);
    }

    #[test_log::test]
    fn test_malformed_asset_is_skipped() {
        let tree = aggregate(vec![asset("badpkg-1.0-py3-none-any.whl")], vec![], NO_RESERVED);

        assert_eq!(tree.variants().count(), 0);
        assert!(tree.global().is_empty());
        assert_eq!(
            tree.skipped(),
            [SkippedWheel {
                filename: "badpkg-1.0-py3-none-any.whl".to_string(),
                reason: SkipReason::InvalidVersion(ClassifyError::InvalidLocalVersion(
                    "1.0".to_string()
                )),
            }]
        );
    }

    #[test_log::test]
    fn test_unparseable_filename_is_skipped() {
        let mut tree = IndexTree::new(NO_RESERVED);
        let skipped = tree.add(asset("not-a-wheel.whl")).unwrap_err();
        assert!(matches!(skipped.reason, SkipReason::InvalidFilename(_)));
    }

    #[test_log::test]
    fn test_path_like_project_names_are_skipped() {
        let tree = aggregate(
            vec![],
            vec![
                listed("../../escaped-1.0-py3-none-any.whl", "cu128_torch27"),
                listed("nested/pkg-1.0-py3-none-any.whl", "cu128_torch27"),
                listed("spaced pkg-1.0-py3-none-any.whl", "cu128_torch27"),
            ],
            NO_RESERVED,
        );

        assert_eq!(tree.variants().count(), 0);
        assert!(tree.global().is_empty());
        assert_eq!(tree.skipped().len(), 3);
        assert!(
            tree.skipped()
                .iter()
                .all(|s| matches!(s.reason, SkipReason::InvalidFilename(_)))
        );
    }

    #[test]
    fn test_url_list_variant_is_authoritative() {
        // Mirrored third-party wheels carry no cuN.torchM tag
        let tree = aggregate(
            vec![],
            vec![listed("decord-0.6.0-py3-none-manylinux2010_x86_64.whl", "cu128_torch27")],
            NO_RESERVED,
        );

        let packages = tree.packages(VariantKey::new(128, 27)).unwrap();
        assert!(packages.contains_key("decord"));
    }

    #[test_log::test]
    fn test_url_list_variant_mismatch_is_skipped() {
        let mut tree = IndexTree::new(NO_RESERVED);
        let skipped = tree
            .add(listed("mypkg-1.0+cu121.torch25-py3-none-any.whl", "cu128_torch27"))
            .unwrap_err();

        assert_eq!(
            skipped.reason,
            SkipReason::VariantMismatch {
                declared: VariantKey::new(128, 27),
                found: VariantKey::new(121, 25),
            }
        );
        assert!(skipped.to_string().contains("listed under cu128_torch27 but built for cu121_torch25"));
    }

    #[test]
    fn test_duplicate_descriptor_is_stored_once() {
        let mut tree = IndexTree::new(NO_RESERVED);
        let wheel = asset("mypkg-1.0+cu128.torch27-py3-none-any.whl");

        assert!(tree.add(wheel.clone()).is_ok());
        assert!(tree.add(wheel).is_ok());

        let entries = &tree.packages(VariantKey::new(128, 27)).unwrap()["mypkg"];
        assert_eq!(entries.len(), 1);
        assert_eq!(tree.global()["mypkg"].len(), 1);
    }

    #[test]
    fn test_same_wheel_from_both_sources_with_same_url_dedups() {
        let filename = "mypkg-1.0+cu128.torch27-py3-none-any.whl";
        let url = "https://example.com/mypkg.whl";
        let tree = aggregate(
            vec![RawWheel::new(filename, url)],
            vec![RawWheel::new(filename, url).in_variant(VariantKey::new(128, 27))],
            NO_RESERVED,
        );

        assert_eq!(tree.global()["mypkg"].len(), 1);
    }

    #[test]
    fn test_global_is_union_of_variants() {
        let tree = aggregate(
            vec![
                asset("mypkg-1.0+cu128.torch27-py3-none-any.whl"),
                asset("mypkg-1.0+cu121.torch25-py3-none-any.whl"),
            ],
            vec![
                listed("mypkg-1.1+cu128.torch27-py3-none-any.whl", "cu128_torch27"),
                listed("otherpkg-2.0+cu121.torch25-py3-none-any.whl", "cu121_torch25"),
            ],
            NO_RESERVED,
        );

        let mut union: BTreeMap<&str, BTreeSet<&IndexEntry>> = BTreeMap::new();
        for variant in tree.variants() {
            for (package, entries) in tree.packages(variant).unwrap() {
                let global = &tree.global()[package];
                assert!(entries.is_subset(global));
                union.entry(package.as_str()).or_default().extend(entries);
            }
        }

        assert_eq!(union.len(), tree.global().len());
        for (package, entries) in tree.global() {
            assert_eq!(entries.iter().collect::<BTreeSet<_>>(), union[package.as_str()]);
        }
        assert_eq!(tree.global()["mypkg"].len(), 3);
    }

    #[test]
    fn test_reserved_package_only_excluded_from_global() {
        let tree = aggregate(
            vec![],
            vec![listed("cosmos_dummy-0.1+cu128.torch27-py3-none-any.whl", "cu128_torch27")],
            ["cosmos-dummy"],
        );

        assert!(tree.is_reserved("cosmos-dummy"));
        assert!(
            tree.packages(VariantKey::new(128, 27))
                .unwrap()
                .contains_key("cosmos-dummy")
        );
        assert!(!tree.global().contains_key("cosmos-dummy"));
    }

    #[test]
    fn test_empty_inputs_produce_empty_tree() {
        let tree = aggregate(vec![], vec![], NO_RESERVED);
        assert_eq!(tree.variants().count(), 0);
        assert!(tree.global().is_empty());
        assert!(tree.skipped().is_empty());
    }
}
