mod app;
mod domain;
mod repo;
mod ui;
mod usecase;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use app::App;
use domain::pr::RepoId;

const DEFAULT_REPO: &str = "apache/ozone";

#[derive(Parser, Debug)]
#[command(author, version, about = "prq — pull-request review queue helper", long_about = None)]
struct Args {
    /// Repository to query, as OWNER/NAME
    #[arg(long, global = true, value_parser = parse_repo, default_value = DEFAULT_REPO)]
    repo: RepoId,

    /// Bypass the on-disk response cache
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the review queue (all READY pull requests)
    #[command(alias = "r")]
    Review,
    /// Show all the open pull requests
    #[command(name = "pull-requests", alias = "pr")]
    PullRequests,
    /// Open a pull request in the browser
    Open { number: u64 },
    /// Show recent GitHub Actions workflow runs
    Builds {
        /// List runs on this user's fork instead
        #[arg(long)]
        user: Option<String>,
        /// Restrict to a branch
        #[arg(long)]
        branch: Option<String>,
    },
}

fn parse_repo(s: &str) -> Result<RepoId, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    // `prq 1234` opens the pull request without going through the parser,
    // so the shortcut stays one keystroke shorter than `prq open 1234`.
    let raw: Vec<String> = std::env::args().collect();
    if raw.len() == 2
        && let Ok(number) = raw[1].parse::<u64>()
    {
        let repo: RepoId = DEFAULT_REPO.parse()?;
        return app::open_pull_request(&repo, number);
    }

    let args = Args::parse();
    match args.command {
        Command::Review => App::new(args.repo, !args.no_cache)?.show_pull_requests(false),
        Command::PullRequests => App::new(args.repo, !args.no_cache)?.show_pull_requests(true),
        Command::Open { number } => app::open_pull_request(&args.repo, number),
        Command::Builds { user, branch } => {
            App::new(args.repo, !args.no_cache)?.show_builds(user.as_deref(), branch.as_deref())
        }
    }
}
