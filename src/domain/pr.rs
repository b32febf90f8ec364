use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

/// `owner/name` pair identifying the repository under triage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(anyhow!("repository must be OWNER/NAME, got {s:?}")),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Mergeable,
    Conflicting,
    Unknown,
}

impl MergeState {
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            Some("MERGEABLE") => Self::Mergeable,
            Some("CONFLICTING") => Self::Conflicting,
            _ => Self::Unknown,
        }
    }
}

/// A reviewer's verdict. States outside the known set are inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    ChangesRequested,
    Commented,
    Other,
}

impl ReviewVerdict {
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            Some("APPROVED") => Self::Approved,
            Some("CHANGES_REQUESTED") => Self::ChangesRequested,
            Some("COMMENTED") => Self::Commented,
            _ => Self::Other,
        }
    }
}

/// Conclusion of one check run. Only failures and cancellations block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckConclusion {
    Success,
    Failure,
    Cancelled,
    Other,
}

impl CheckConclusion {
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            Some("SUCCESS") => Self::Success,
            Some("FAILURE") => Self::Failure,
            Some("CANCELLED") => Self::Cancelled,
            _ => Self::Other,
        }
    }

    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Failure | Self::Cancelled)
    }
}

#[derive(Debug, Clone)]
pub struct Review {
    pub reviewer: String,
    pub verdict: ReviewVerdict,
    /// RFC-3339, kept raw; parsed only when two reviews by the same
    /// reviewer have to be ordered.
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CheckRun {
    pub conclusion: CheckConclusion,
}

/// One commit record with the check runs of all its suites flattened.
#[derive(Debug, Clone, Default)]
pub struct Commit {
    pub check_runs: Vec<CheckRun>,
}

/// Read-only view of one open pull request, built once per invocation
/// from the API response and never mutated.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub author: String,
    pub title: String,
    pub mergeable: MergeState,
    /// Head commit first, per the query ordering.
    pub commits: Vec<Commit>,
    /// Raw review events in API order.
    pub reviews: Vec<Review>,
    /// Participant logins in API order.
    pub participants: Vec<String>,
}

impl PullRequest {
    pub fn head_commit(&self) -> Option<&Commit> {
        self.commits.first()
    }
}
