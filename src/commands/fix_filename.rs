use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::wheel::{VariantKey, WheelFilename};

/// What happened to one wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rename {
    AlreadyCorrect(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

/// Rewrites the local version tag of each wheel to `+cu{cuda}.torch{torch}`,
/// keeping the base version, and renames the file in place. With `dry_run`
/// only the intended renames are reported.
#[tracing::instrument(skip(runtime, paths))]
pub fn fix_filename<R: Runtime>(
    runtime: &R,
    paths: &[PathBuf],
    variant: VariantKey,
    dry_run: bool,
) -> Result<Vec<Rename>> {
    let mut results = Vec::with_capacity(paths.len());

    for path in paths {
        let target = fixed_path(path, variant)?;

        if target == *path {
            println!("Wheel filename is already correct: '{}'", path.display());
            results.push(Rename::AlreadyCorrect(path.clone()));
            continue;
        }

        println!(
            "Renaming wheel: '{}' -> '{}'",
            path.display(),
            target.display()
        );
        if dry_run {
            debug!("Dry run, leaving {} in place", path.display());
        } else {
            runtime.rename(path, &target)?;
        }
        results.push(Rename::Renamed {
            from: path.clone(),
            to: target,
        });
    }

    Ok(results)
}

/// The path `wheel` would have with its local version set to `variant`.
pub fn fixed_path(wheel: &Path, variant: VariantKey) -> Result<PathBuf> {
    let name = wheel
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("'{}' has no file name", wheel.display()))?;

    let mut parsed: WheelFilename = name.parse()?;
    parsed.version = format!("{}+{}", parsed.base_version(), variant.local_version());

    Ok(wheel.with_file_name(parsed.to_string()))
}
