use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::pr::{MergeState, PullRequest, Review, ReviewVerdict};

/// Latest review per reviewer login. Keyed by login so iteration order is
/// stable (the upstream review feed has no useful order to preserve).
pub type LatestReviews<'a> = BTreeMap<&'a str, &'a Review>;

/// Reduce the raw review feed to one review per reviewer: the one with the
/// strictly latest `updatedAt`. Equal timestamps keep the first-seen review.
///
/// Timestamps are only parsed when the same reviewer shows up twice; a
/// malformed one is a contract violation and fails the whole run.
pub fn latest_reviews(reviews: &[Review]) -> Result<LatestReviews<'_>> {
    let mut latest: LatestReviews = BTreeMap::new();
    for review in reviews {
        match latest.entry(review.reviewer.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(review);
            }
            Entry::Occupied(mut slot) => {
                let stored = parse_updated_at(slot.get())?;
                let candidate = parse_updated_at(review)?;
                if candidate > stored {
                    slot.insert(review);
                }
            }
        }
    }
    Ok(latest)
}

fn parse_updated_at(review: &Review) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(&review.updated_at, &Rfc3339).with_context(|| {
        format!(
            "review by {} has malformed updatedAt {:?}",
            review.reviewer, review.updated_at
        )
    })
}

/// Whether a pull request is ready for review: no merge conflict, no failed
/// or cancelled check run on the head commit, and no reviewer whose latest
/// verdict requests changes.
pub fn ready(pr: &PullRequest) -> Result<bool> {
    if pr.mergeable == MergeState::Conflicting {
        return Ok(false);
    }

    // Only the head commit is consulted; check runs on older commits carry
    // no signal either way.
    if let Some(head) = pr.head_commit()
        && head.check_runs.iter().any(|run| run.conclusion.is_blocking())
    {
        return Ok(false);
    }

    let latest = latest_reviews(&pr.reviews)?;
    Ok(!latest
        .values()
        .any(|review| review.verdict == ReviewVerdict::ChangesRequested))
}
