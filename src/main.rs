//! leakwatch CLI entry point.
//!
//! Scans the added lines of a diff for secrets and personal data and reports
//! them locally or as a GitHub check run.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use leakwatch::application::review::pipeline::{self, RunReport};
use leakwatch::infra::cli::diff::{DiffSource, read_stdin_diff};
use leakwatch::infra::scan::inspector_for;
use leakwatch::infra::vcs::HostRegistry;
use leakwatch::infra::vcs::github::{self, GitHubHost, GitHubPrRef, parse_pr_ref};
use leakwatch::infra::vcs::local::LocalHost;

const PR_REF_HINT: &str = "Use owner/repo#number or a URL.";

#[derive(Parser, Debug)]
#[command(name = "leakwatch")]
#[command(version)]
#[command(about = "Scan diffs for secrets and personal data", long_about = None)]
struct Args {
    /// Config file (default: $LEAKWATCH_CONFIG_PATH, ./.leakwatch.toml or
    /// ~/.config/leakwatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Where results go (default: github for `pr`, local otherwise)
    #[arg(long, value_enum, global = true)]
    host: Option<HostKind>,

    /// Inspection backend
    #[arg(short, long, default_value = "regex", global = true)]
    inspector: String,

    /// Print findings instead of publishing them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Commit to report on instead of the pull request head
    #[arg(long, global = true)]
    sha: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HostKind {
    Local,
    Github,
}

impl HostKind {
    fn id(self) -> &'static str {
        match self {
            HostKind::Local => "local",
            HostKind::Github => "github",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan changes between branches/tags/commits
    Diff {
        /// Source ref
        from: String,
        /// Target ref
        to: String,
    },

    /// Scan uncommitted changes
    Status,

    /// Scan a diff piped on stdin
    Stdin,

    /// Scan a git stash entry
    Stash {
        /// Stash index (default: 0, latest)
        #[arg(default_value = "0")]
        index: usize,
    },

    /// Scan a GitHub PR
    Pr {
        /// PR reference (owner/repo#number or URL)
        pr_ref: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args).await {
        Ok((report, host)) => {
            if report.comments.is_empty() {
                log::info!("No potentially sensitive items found");
                ExitCode::SUCCESS
            } else if host == HostKind::Local {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<(RunReport, HostKind)> {
    let pr = match &args.command {
        Commands::Pr { pr_ref } => {
            let pr = parse_pr_ref(pr_ref)
                .with_context(|| format!("Invalid PR reference '{pr_ref}'. {PR_REF_HINT}"))?;
            Some(pr)
        }
        _ => None,
    };

    let kind = match (args.dry_run, args.host) {
        (true, _) => HostKind::Local,
        (false, Some(kind)) => kind,
        (false, None) if pr.is_some() => HostKind::Github,
        (false, None) => HostKind::Local,
    };

    let mut registry = HostRegistry::new();
    if kind == HostKind::Local {
        let source = local_source(&args.command, pr.as_ref()).await?;
        let local = LocalHost::new(source).with_config_path(args.config.clone());
        registry.register(Box::new(local));
    }
    if let Some(pr) = pr {
        let github = GitHubHost::new(pr)
            .with_config_path(args.config.clone())
            .with_head_sha(args.sha.clone());
        registry.register(Box::new(github));
    }

    let Some(host) = registry.get_host(kind.id()) else {
        anyhow::bail!(
            "The {} host needs a pull request (`leakwatch pr ...`)",
            kind.id()
        );
    };

    let config = host.load_config()?;
    let inspector = inspector_for(&args.inspector, &config)?;
    let report = pipeline::run(host, inspector.as_ref(), &config).await?;
    Ok((report, kind))
}

/// Diff source for the local host. Pull requests are fetched up front.
async fn local_source(command: &Commands, pr: Option<&GitHubPrRef>) -> Result<DiffSource> {
    Ok(match command {
        Commands::Diff { from, to } => DiffSource::GitDiff {
            from: from.clone(),
            to: to.clone(),
        },
        Commands::Status => DiffSource::GitStatus,
        Commands::Stdin => DiffSource::Text(read_stdin_diff()?),
        Commands::Stash { index } => DiffSource::Stash { index: *index },
        Commands::Pr { .. } => match pr {
            Some(pr) => DiffSource::Text(github::fetch_pr_diff(pr).await?),
            None => DiffSource::Text(String::new()),
        },
    })
}
