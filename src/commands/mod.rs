//! Command implementations behind the CLI.

mod build;
pub mod config;
mod fix_filename;

pub use build::{BuildOptions, BuildSummary, ManifestSource, build, run};
pub use fix_filename::{Rename, fix_filename, fixed_path};
