use anyhow::Result;

use super::readiness::{LatestReviews, latest_reviews};
use crate::domain::pr::{PullRequest, ReviewVerdict};

/// Display width of a reviewer login after its verdict mark.
const REVIEWER_WIDTH: usize = 4;
/// Display width of a non-reviewing participant login.
const PARTICIPANT_WIDTH: usize = 5;

/// Build the display tokens for a pull request's participants: reviewers
/// requesting changes, then approvers, then commenters, then everyone else
/// who neither reviewed nor authored the pull request.
pub fn participants(pr: &PullRequest, author: &str) -> Result<Vec<String>> {
    let latest = latest_reviews(&pr.reviews)?;

    let mut tokens = Vec::new();
    push_verdict_group(&mut tokens, &latest, author, ReviewVerdict::ChangesRequested, "✕");
    push_verdict_group(&mut tokens, &latest, author, ReviewVerdict::Approved, "✓");
    push_verdict_group(&mut tokens, &latest, author, ReviewVerdict::Commented, "");

    for login in &pr.participants {
        if !latest.contains_key(login.as_str()) && login != author {
            tokens.push(clip(&login.to_uppercase(), PARTICIPANT_WIDTH));
        }
    }

    Ok(tokens)
}

fn push_verdict_group(
    tokens: &mut Vec<String>,
    latest: &LatestReviews<'_>,
    author: &str,
    verdict: ReviewVerdict,
    mark: &str,
) {
    // The author can show up as a reviewer of their own pull request by
    // commenting on it; they are never listed.
    for review in latest
        .values()
        .filter(|review| review.verdict == verdict && review.reviewer != author)
    {
        tokens.push(format!(
            "{mark}{}",
            clip(&review.reviewer.to_uppercase(), REVIEWER_WIDTH)
        ));
    }
}

/// Truncate to at most `max` characters. Clipping is part of a token's
/// identity: two logins may collide once clipped and are not deduplicated
/// further.
pub fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pr::{CheckConclusion, CheckRun, Commit, MergeState, Review};
    use crate::usecase::readiness::ready;

    fn review(reviewer: &str, verdict: ReviewVerdict, updated_at: &str) -> Review {
        Review {
            reviewer: reviewer.to_string(),
            verdict,
            updated_at: updated_at.to_string(),
        }
    }

    fn pr(reviews: Vec<Review>, participant_logins: &[&str]) -> PullRequest {
        PullRequest {
            number: 7,
            author: "dave".to_string(),
            title: "a change".to_string(),
            mergeable: MergeState::Mergeable,
            commits: vec![Commit {
                check_runs: vec![CheckRun {
                    conclusion: CheckConclusion::Success,
                }],
            }],
            reviews,
            participants: participant_logins.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn groups_then_non_reviewers() {
        // One approval, one change request, one bystander, and the author.
        let pr = pr(
            vec![
                review("alice", ReviewVerdict::Approved, "2024-05-01T10:00:00Z"),
                review("bob", ReviewVerdict::ChangesRequested, "2024-05-02T10:00:00Z"),
            ],
            &["alice", "bob", "carol"],
        );

        assert!(!ready(&pr).unwrap());
        assert_eq!(
            participants(&pr, "dave").unwrap(),
            vec!["✕BOB", "✓ALIC", "CAROL"]
        );
    }

    #[test]
    fn author_never_listed_and_reviewers_listed_once() {
        let pr = pr(
            vec![
                review("alice", ReviewVerdict::Commented, "2024-05-01T10:00:00Z"),
                review("alice", ReviewVerdict::Approved, "2024-05-02T10:00:00Z"),
                review("dave", ReviewVerdict::Commented, "2024-05-01T11:00:00Z"),
            ],
            &["alice", "dave", "erin"],
        );

        let tokens = participants(&pr, "dave").unwrap();
        // The author both reviewed and participates and still must not
        // appear; alice's two reviews collapse to one token.
        assert_eq!(tokens, vec!["✓ALIC", "ERIN"]);

        let mut deduped = tokens.clone();
        deduped.dedup();
        assert_eq!(deduped, tokens);
    }

    #[test]
    fn author_as_plain_participant_is_dropped() {
        let pr = pr(Vec::new(), &["dave", "erin"]);
        assert_eq!(participants(&pr, "dave").unwrap(), vec!["ERIN"]);
    }

    #[test]
    fn non_reviewers_keep_upstream_order() {
        let pr = pr(Vec::new(), &["zoe", "adam", "mallory"]);
        assert_eq!(
            participants(&pr, "dave").unwrap(),
            vec!["ZOE", "ADAM", "MALLO"]
        );
    }

    #[test]
    fn reviewer_groups_are_login_sorted() {
        let pr = pr(
            vec![
                review("walter", ReviewVerdict::Approved, "2024-05-01T10:00:00Z"),
                review("alice", ReviewVerdict::Approved, "2024-05-01T11:00:00Z"),
                review("bob", ReviewVerdict::ChangesRequested, "2024-05-01T12:00:00Z"),
            ],
            &[],
        );
        assert_eq!(
            participants(&pr, "dave").unwrap(),
            vec!["✕BOB", "✓ALIC", "✓WALT"]
        );
    }

    #[test]
    fn clip_counts_characters() {
        assert_eq!(clip("ALICE", 4), "ALIC");
        assert_eq!(clip("BOB", 4), "BOB");
        assert_eq!(clip("", 4), "");
    }
}
