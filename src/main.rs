use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cleanup::CleanupOptions;
use crate::github::GithubClientImpl;

mod cleanup;
mod github;
mod retention;

/// Delete old untagged or disposable-tagged versions of an organization's
/// GitHub container packages.
#[derive(Parser)]
#[clap(version)]
struct Args {
    /// Organization owning the packages
    #[clap(long, env = "GITHUB_ORG_NAME")]
    org: String,

    /// Only clean packages whose name starts with this prefix
    #[clap(long, env = "CONTAINER_PREFIX", default_value = "writing-")]
    prefix: String,

    /// Path to a file containing a GitHub token.
    /// You can also pass a token verbatim via the GITHUB_TOKEN env variable.
    #[clap(long)]
    token: Option<String>,

    /// Don't persist but only print changes
    #[clap(long, short = 'n')]
    dry_run: bool,

    /// Make logging more verbose.
    /// You can also specify the log level via the RUST_LOG env variable.
    #[clap(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if env::var("RUST_LOG").is_err() {
        let level = match args.verbose {
            true => "debug",
            false => "info",
        };
        env::set_var(
            "RUST_LOG",
            format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), level),
        );
    }
    env_logger::init();

    log::info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );
    log::debug!("With arguments {:?}", env::args().collect::<Vec<_>>());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{:?}", error);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let token = read_token(args.token.as_deref()).await?;
    let client = GithubClientImpl::new(token).context("Failed to create github client")?;

    let options = CleanupOptions {
        org: args.org,
        prefix: args.prefix,
        dry_run: args.dry_run,
    };
    let summary = cleanup::run(&client, &options, chrono::Utc::now()).await?;
    log::info!("{}", summary);

    Ok(())
}

async fn read_token(path: Option<&str>) -> Result<String> {
    let token = match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .context(format!("Failed to read the github token from {}", path))?
            .trim()
            .to_string(),
        None => env::var("GITHUB_TOKEN")
            .context("No github token provided via --token or GITHUB_TOKEN")?,
    };

    if token.is_empty() {
        anyhow::bail!("The provided github token is empty");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["ghcr-prune", "--org", "any-xi", "-n"]).unwrap();
        assert_eq!(args.org, "any-xi");
        assert!(args.dry_run);
        assert!(!args.verbose);
        assert!(args.token.is_none());

        let args = Args::try_parse_from([
            "ghcr-prune",
            "--org",
            "any-xi",
            "--prefix",
            "reading-",
            "--token",
            "/run/secrets/token",
        ])
        .unwrap();
        assert_eq!(args.prefix, "reading-");
        assert_eq!(args.token.as_deref(), Some("/run/secrets/token"));
    }

    #[tokio::test]
    async fn test_read_token_from_file() {
        let path = env::temp_dir().join(format!("ghcr-prune-token-{}", std::process::id()));
        tokio::fs::write(&path, "ghp_secret\n").await.unwrap();

        let token = read_token(path.to_str()).await.unwrap();
        assert_eq!(token, "ghp_secret");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_token_missing_file() {
        let error = read_token(Some("/nonexistent/ghcr-prune/token"))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("/nonexistent/ghcr-prune/token"));
    }
}
