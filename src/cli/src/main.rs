//! CLI for upgradechannel-discovery.
//!
//! Runs a single discovery pass against one source and writes the resulting
//! version records as JSON to a file or stdout.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use upgradechannel_discovery::{
    versions, AggregateError, DiscoveryError, GitConfig, GitReleaseFinder, GithubConfig,
    GithubReleaseFinder,
};

/// Discover release versions and emit them as upgrade channel JSON.
#[derive(Parser, Debug)]
#[command(name = "upgradechannel-discovery", author, version, about, long_about = None)]
struct Args {
    /// File to write the resulting JSON to. Prints to stdout when empty.
    #[arg(long, env = "OUTPUT_FILE", default_value = "/data/output", global = true)]
    output_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover versions from the releases of a GitHub repository.
    Github(GithubArgs),

    /// Discover versions from JSON manifests in a git repository.
    Git(GitArgs),
}

#[derive(clap::Args, Debug)]
struct GithubArgs {
    /// Image prefix to use when returning JSON data.
    #[arg(long, env = "IMAGE_PREFIX", default_value = "")]
    image_prefix: String,

    /// GitHub token used to authenticate when fetching releases.
    #[arg(long, env = "GITHUB_TOKEN", default_value = "", hide_env_values = true)]
    github_token: String,

    /// Version name prefix.
    #[arg(long, env = "VERSION_NAME_PREFIX", default_value = "")]
    version_name_prefix: String,

    /// Version name suffix.
    #[arg(long, env = "VERSION_NAME_SUFFIX", default_value = "")]
    version_name_suffix: String,

    /// Prefix added to each release tag.
    #[arg(long, env = "VERSION_PREFIX", default_value = "")]
    version_prefix: String,

    /// Suffix appended to each release tag.
    #[arg(long, env = "VERSION_SUFFIX", default_value = "")]
    version_suffix: String,

    /// GitHub repository to scan releases against.
    #[arg(long, env = "REPOSITORY", default_value = "rancher-sandbox/os2")]
    repository: String,

    /// Include pre-releases in the releases scan.
    #[arg(long, env = "PRE_RELEASES", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pre_releases: bool,

    /// GitHub API base URL, for GitHub Enterprise instances.
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,
}

impl GithubArgs {
    fn into_config(self) -> GithubConfig {
        let mut config = GithubConfig::new()
            .with_repository(self.repository)
            .with_token(self.github_token)
            .with_version_name_prefix(self.version_name_prefix)
            .with_version_name_suffix(self.version_name_suffix)
            .with_version_prefix(self.version_prefix)
            .with_version_suffix(self.version_suffix)
            .with_base_image(self.image_prefix)
            .with_pre_releases(self.pre_releases);
        if let Some(api_url) = self.github_api_url {
            config = config.with_api_url(api_url);
        }
        config
    }
}

#[derive(clap::Args, Debug)]
struct GitArgs {
    /// Git repository to clone.
    #[arg(long, env = "REPOSITORY", default_value = "")]
    repository: String,

    /// Repository subpath to read versions from.
    #[arg(long, env = "SUBPATH", default_value = "")]
    subpath: String,

    /// Repository branch to read versions from.
    #[arg(long, env = "BRANCH", default_value = "")]
    branch: String,
}

impl GitArgs {
    fn into_config(self) -> GitConfig {
        GitConfig::new()
            .with_repository(self.repository)
            .with_subpath(self.subpath)
            .with_branch(self.branch)
    }
}

/// Errors that end the process with a failure status.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// A source could not be set up.
    #[error(transparent)]
    Setup(#[from] DiscoveryError),

    /// One or more sources failed during discovery.
    #[error(transparent)]
    Discovery(#[from] AggregateError),

    /// The output file could not be written.
    #[error("Failed to write output to '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();

    // Ignore the error; a provider may already be installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Parse arguments
    let args = Args::parse();

    // Run the main logic
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Discovery failed");
            ExitCode::from(1)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output) written to stderr, keeping
///   stdout free for the JSON result
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(args: Args) -> Result<(), CliError> {
    let json = match args.command {
        Command::Github(github) => {
            let finder = GithubReleaseFinder::new(github.into_config())?;
            versions(&[&finder]).await.into_result()?
        }
        Command::Git(git) => {
            let finder = GitReleaseFinder::new(git.into_config());
            versions(&[&finder]).await.into_result()?
        }
    };

    write_output(&args.output_file, &json).await
}

/// Writes the JSON result to `output_file`, or stdout when it is empty.
async fn write_output(output_file: &str, json: &[u8]) -> Result<(), CliError> {
    if output_file.is_empty() {
        print!("{}", String::from_utf8_lossy(json));
        return Ok(());
    }

    tokio::fs::write(output_file, json)
        .await
        .map_err(|source| CliError::Output {
            path: PathBuf::from(output_file),
            source,
        })?;
    info!(path = output_file, bytes = json.len(), "Output written");
    Ok(())
}
