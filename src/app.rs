use std::io;

use anyhow::{Context, Result};

use crate::domain::pr::RepoId;
use crate::repo::ResponseCache;
use crate::repo::cache::{FileCache, NoCache};
use crate::repo::github::{self, auth, builds};
use crate::ui;
use crate::usecase::{participants, readiness};

pub struct App {
    repo: RepoId,
    cache: Box<dyn ResponseCache>,
}

impl App {
    pub fn new(repo: RepoId, use_cache: bool) -> Result<Self> {
        let cache: Box<dyn ResponseCache> = if use_cache {
            Box::new(FileCache::open_default()?)
        } else {
            Box::new(NoCache)
        };
        Ok(Self { repo, cache })
    }

    /// Print the pull-request table; with `all` false only rows that are
    /// ready for review survive.
    pub fn show_pull_requests(&self, all: bool) -> Result<()> {
        let token = auth::resolve_token()?;
        let prs = github::load_open_pull_requests(&token, &self.repo, self.cache.as_ref())?;

        let mut rows = Vec::new();
        for pr in &prs {
            let is_ready = readiness::ready(pr)?;
            if !all && !is_ready {
                continue;
            }
            let tokens = participants::participants(pr, &pr.author)?;
            rows.push(ui::pull_request_row(pr, &tokens));
        }
        tracing::debug!(total = prs.len(), shown = rows.len(), "rendering table");

        ui::render_table(&mut io::stdout().lock(), &ui::PULL_REQUEST_HEADERS, &rows)?;
        Ok(())
    }

    /// Print recent workflow runs for the repository, or for `user`'s fork.
    pub fn show_builds(&self, user: Option<&str>, branch: Option<&str>) -> Result<()> {
        let token = auth::resolve_token()?;
        let owner = user.unwrap_or(&self.repo.owner);
        let runs = builds::fetch_workflow_runs_sync(&token, owner, &self.repo.name, branch)?;

        let rows: Vec<_> = runs.iter().map(ui::workflow_run_row).collect();
        ui::render_table(&mut io::stdout().lock(), &ui::BUILD_HEADERS, &rows)?;
        Ok(())
    }
}

pub fn open_pull_request(repo: &RepoId, number: u64) -> Result<()> {
    let url = format!("https://github.com/{repo}/pull/{number}");
    open::that(&url).with_context(|| format!("failed to open {url}"))
}
