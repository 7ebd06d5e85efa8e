use anyhow::Result;
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use wheel_index::commands::{BuildOptions, ManifestSource, build, fix_filename};
use wheel_index::github::GitHubRepo;
use wheel_index::upstream::{DEFAULT_UPSTREAM_PACKAGES, DEFAULT_UPSTREAM_URL, OverlayConfig};
use wheel_index::wheel::VariantKey;

/// wheel-index - PEP 503 index builder for CUDA/Torch wheel variants
///
/// Builds a static simple index from the wheels attached to a GitHub release
/// and from per-variant URL lists, mirroring selected packages from an
/// upstream index.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for
/// authentication against the GitHub API.
#[derive(Parser, Debug)]
#[command(author, version = env!("WHEEL_INDEX_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Build the index from release assets and URL lists
    Build(BuildArgs),

    /// Set the +cuN.torchM local version of wheel filenames
    FixFilename(FixFilenameArgs),
}

#[derive(clap::Args, Debug)]
struct BuildArgs {
    /// Directory of URL lists (<variant>.txt or <variant>/urls.txt)
    #[arg(long = "input-dir", short = 'i', value_name = "PATH")]
    input_dir: PathBuf,

    /// Output directory (removed and rebuilt)
    #[arg(long = "output-dir", short = 'o', value_name = "PATH")]
    output_dir: PathBuf,

    /// Release tag whose assets are indexed
    #[arg(long, required_unless_present = "assets_file", conflicts_with = "assets_file")]
    tag: Option<String>,

    /// Read release assets from a JSON file instead of the GitHub API
    #[arg(long = "assets-file", value_name = "PATH")]
    assets_file: Option<PathBuf>,

    /// GitHub repository holding the release
    #[arg(long, value_name = "OWNER/REPO", default_value = "nvidia-cosmos/cosmos-dependencies")]
    repo: GitHubRepo,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL")]
    api_url: Option<String>,

    /// Upstream index base URL
    #[arg(
        long = "upstream-url",
        value_name = "URL",
        env = "WHEEL_INDEX_UPSTREAM_URL",
        default_value = DEFAULT_UPSTREAM_URL
    )]
    upstream_url: String,

    /// Package mirrored from the upstream index (repeatable)
    #[arg(long = "upstream-package", value_name = "NAME", default_values_t = DEFAULT_UPSTREAM_PACKAGES.map(String::from))]
    upstream_packages: Vec<String>,

    /// Do not mirror any package from the upstream index
    #[arg(long = "no-upstream")]
    no_upstream: bool,

    /// Package name kept out of the global index (repeatable)
    #[arg(long = "reserved-package", value_name = "NAME", default_value = "cosmos-dummy")]
    reserved_packages: Vec<String>,
}

impl BuildArgs {
    fn into_options(self) -> BuildOptions {
        let manifest = match (self.assets_file, self.tag) {
            (Some(path), _) => ManifestSource::File(path),
            (None, Some(tag)) => ManifestSource::Release {
                repo: self.repo,
                tag,
            },
            // clap requires one of the two
            (None, None) => unreachable!("--tag or --assets-file is required"),
        };

        let overlay = (!self.no_upstream)
            .then(|| OverlayConfig::new(self.upstream_packages, self.upstream_url));

        BuildOptions {
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            manifest,
            overlay,
            reserved_packages: self.reserved_packages.into_iter().collect::<BTreeSet<_>>(),
        }
    }
}

#[derive(clap::Args, Debug)]
struct FixFilenameArgs {
    /// Wheel files to rename
    #[arg(long = "input", short = 'i', value_name = "PATH", required = true, num_args = 1..)]
    input_paths: Vec<PathBuf>,

    /// CUDA version (e.g. 128)
    #[arg(long)]
    cuda: u32,

    /// Torch version (e.g. 27)
    #[arg(long)]
    torch: u32,

    /// Only report what would be renamed
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = wheel_index::runtime::RealRuntime;

    match cli.command {
        Commands::Build(args) => {
            let api_url = args.api_url.clone();
            build(runtime, args.into_options(), api_url).await?
        }
        Commands::FixFilename(args) => {
            let variant = VariantKey::new(args.cuda, args.torch);
            fix_filename(&runtime, &args.input_paths, variant, args.dry_run)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_build_parsing() {
        let cli = Cli::try_parse_from([
            "wheel-index", "build", "-i", "in", "-o", "out", "--tag", "v1.2.0",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("Expected Build command");
        };

        assert_eq!(args.input_dir, PathBuf::from("in"));
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.tag.as_deref(), Some("v1.2.0"));
        assert_eq!(args.repo.to_string(), "nvidia-cosmos/cosmos-dependencies");
        assert_eq!(args.upstream_packages, ["torch", "torchvision", "torchaudio"]);
        assert_eq!(args.reserved_packages, ["cosmos-dummy"]);

        let options = args.into_options();
        assert!(matches!(options.manifest, ManifestSource::Release { ref tag, .. } if tag == "v1.2.0"));
        let overlay = options.overlay.unwrap();
        assert!(overlay.contains("torchvision"));
    }

    #[test]
    fn test_cli_build_assets_file_and_no_upstream() {
        let cli = Cli::try_parse_from([
            "wheel-index",
            "build",
            "-i",
            "in",
            "-o",
            "out",
            "--assets-file",
            "assets.json",
            "--no-upstream",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("Expected Build command");
        };

        let options = args.into_options();
        assert_eq!(options.manifest, ManifestSource::File(PathBuf::from("assets.json")));
        assert!(options.overlay.is_none());
    }

    #[test]
    fn test_cli_build_custom_upstream_packages() {
        let cli = Cli::try_parse_from([
            "wheel-index",
            "build",
            "-i",
            "in",
            "-o",
            "out",
            "--tag",
            "v1",
            "--upstream-package",
            "triton",
            "--upstream-url",
            "https://mirror.example.com/whl",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("Expected Build command");
        };

        let overlay = args.into_options().overlay.unwrap();
        assert_eq!(overlay, OverlayConfig::new(["triton"], "https://mirror.example.com/whl"));
    }

    #[test]
    fn test_cli_build_requires_manifest_source() {
        let result = Cli::try_parse_from(["wheel-index", "build", "-i", "in", "-o", "out"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_build_rejects_invalid_repo() {
        let result = Cli::try_parse_from([
            "wheel-index", "build", "-i", "in", "-o", "out", "--tag", "v1", "--repo", "nope",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_fix_filename_parsing() {
        let cli = Cli::try_parse_from([
            "wheel-index",
            "fix-filename",
            "-i",
            "a.whl",
            "b.whl",
            "--cuda",
            "128",
            "--torch",
            "27",
            "--dry-run",
        ])
        .unwrap();
        let Commands::FixFilename(args) = cli.command else {
            panic!("Expected FixFilename command");
        };

        assert_eq!(args.input_paths, [PathBuf::from("a.whl"), PathBuf::from("b.whl")]);
        assert_eq!(args.cuda, 128);
        assert_eq!(args.torch, 27);
        assert!(args.dry_run);
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["wheel-index"]).is_err());
    }
}
