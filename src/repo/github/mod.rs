pub mod auth;
pub mod builds;

use anyhow::{Context, Result, anyhow, bail};
use octocrab::Octocrab;

use crate::domain::pr::{
    CheckConclusion, CheckRun, Commit, MergeState, PullRequest, RepoId, Review, ReviewVerdict,
};
use crate::repo::ResponseCache;

#[derive(Debug, serde::Serialize)]
struct GraphQlPayload<V> {
    query: &'static str,
    variables: V,
}

#[derive(Debug, serde::Serialize)]
struct PullRequestVars<'a> {
    owner: &'a str,
    name: &'a str,
}

// Raw response layer. Everything the schema allows to be absent is an
// Option; the mapping below turns absence into empty values.

#[derive(Debug, serde::Deserialize)]
struct QueryData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, serde::Deserialize)]
struct RepositoryNode {
    #[serde(rename = "pullRequests")]
    pull_requests: Option<PullRequestConnection>,
}

#[derive(Debug, serde::Deserialize)]
struct PullRequestConnection {
    edges: Option<Vec<PullRequestEdge>>,
}

#[derive(Debug, serde::Deserialize)]
struct PullRequestEdge {
    node: Option<PullRequestNode>,
}

#[derive(Debug, serde::Deserialize)]
struct PullRequestNode {
    number: u64,
    author: Option<Actor>,
    title: Option<String>,
    mergeable: Option<String>,
    commits: Option<CommitConnection>,
    reviews: Option<ReviewConnection>,
    participants: Option<ParticipantConnection>,
}

#[derive(Debug, serde::Deserialize)]
struct Actor {
    login: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CommitConnection {
    edges: Option<Vec<CommitEdge>>,
}

#[derive(Debug, serde::Deserialize)]
struct CommitEdge {
    node: Option<CommitNode>,
}

#[derive(Debug, serde::Deserialize)]
struct CommitNode {
    commit: Option<CommitInner>,
}

#[derive(Debug, serde::Deserialize)]
struct CommitInner {
    #[serde(rename = "checkSuites")]
    check_suites: Option<CheckSuiteConnection>,
}

#[derive(Debug, serde::Deserialize)]
struct CheckSuiteConnection {
    edges: Option<Vec<CheckSuiteEdge>>,
}

#[derive(Debug, serde::Deserialize)]
struct CheckSuiteEdge {
    node: Option<CheckSuiteNode>,
}

#[derive(Debug, serde::Deserialize)]
struct CheckSuiteNode {
    #[serde(rename = "checkRuns")]
    check_runs: Option<CheckRunConnection>,
}

#[derive(Debug, serde::Deserialize)]
struct CheckRunConnection {
    edges: Option<Vec<CheckRunEdge>>,
}

#[derive(Debug, serde::Deserialize)]
struct CheckRunEdge {
    node: Option<CheckRunNode>,
}

#[derive(Debug, serde::Deserialize)]
struct CheckRunNode {
    conclusion: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ReviewConnection {
    nodes: Option<Vec<ReviewNode>>,
}

#[derive(Debug, serde::Deserialize)]
struct ReviewNode {
    author: Option<Actor>,
    state: Option<String>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ParticipantConnection {
    edges: Option<Vec<ParticipantEdge>>,
}

#[derive(Debug, serde::Deserialize)]
struct ParticipantEdge {
    node: Option<Actor>,
}

const PULL_REQUESTS_QUERY: &str = r#"
query ($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    pullRequests(states: OPEN, first: 100, orderBy: {field: CREATED_AT, direction: DESC}) {
      edges {
        node {
          number
          author {
            login
          }
          title
          mergeable
          commits(last: 1) {
            edges {
              node {
                commit {
                  checkSuites(first: 20) {
                    edges {
                      node {
                        checkRuns(first: 50) {
                          edges {
                            node {
                              conclusion
                            }
                          }
                        }
                      }
                    }
                  }
                }
              }
            }
          }
          reviews(first: 100) {
            nodes {
              author {
                login
              }
              state
              updatedAt
            }
          }
          participants(first: 50) {
            edges {
              node {
                login
              }
            }
          }
        }
      }
    }
  }
}
"#;

fn login_of(actor: Option<Actor>) -> String {
    actor.and_then(|a| a.login).unwrap_or_default()
}

fn to_commit(edge: CommitEdge) -> Commit {
    let suites = edge
        .node
        .and_then(|n| n.commit)
        .and_then(|c| c.check_suites)
        .and_then(|s| s.edges)
        .unwrap_or_default();

    let mut check_runs = Vec::new();
    for suite in suites {
        let runs = suite
            .node
            .and_then(|n| n.check_runs)
            .and_then(|r| r.edges)
            .unwrap_or_default();
        for run in runs {
            let conclusion = run.node.and_then(|n| n.conclusion);
            check_runs.push(CheckRun {
                conclusion: CheckConclusion::from_api(conclusion.as_deref()),
            });
        }
    }
    Commit { check_runs }
}

fn to_review(node: ReviewNode) -> Review {
    Review {
        reviewer: login_of(node.author),
        verdict: ReviewVerdict::from_api(node.state.as_deref()),
        updated_at: node.updated_at.unwrap_or_default(),
    }
}

fn to_pull_request(node: PullRequestNode) -> PullRequest {
    let commits = node
        .commits
        .and_then(|c| c.edges)
        .unwrap_or_default()
        .into_iter()
        .map(to_commit)
        .collect();

    let reviews = node
        .reviews
        .and_then(|r| r.nodes)
        .unwrap_or_default()
        .into_iter()
        .map(to_review)
        .collect();

    let participants = node
        .participants
        .and_then(|p| p.edges)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|edge| edge.node.and_then(|a| a.login))
        .collect();

    PullRequest {
        number: node.number,
        author: login_of(node.author),
        title: node.title.unwrap_or_default(),
        mergeable: MergeState::from_api(node.mergeable.as_deref()),
        commits,
        reviews,
        participants,
    }
}

/// Parse a raw GraphQL response body into the typed model. A body that is
/// not a GraphQL response at all is an error; any missing optional field
/// inside it is not.
pub fn parse_pull_requests(body: &str) -> Result<Vec<PullRequest>> {
    #[derive(Debug, serde::Deserialize)]
    struct GraphQlResponse {
        data: Option<QueryData>,
    }

    let resp: GraphQlResponse =
        serde_json::from_str(body).context("GraphQL response body did not parse")?;

    let prs: Vec<PullRequest> = resp
        .data
        .and_then(|d| d.repository)
        .and_then(|r| r.pull_requests)
        .and_then(|c| c.edges)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|edge| edge.node)
        .map(to_pull_request)
        .collect();

    tracing::debug!(count = prs.len(), "parsed open pull requests");
    Ok(prs)
}

/// POST the pull-request query and hand back the raw response body, so the
/// cache can store exactly what came over the wire.
pub async fn fetch_open_pull_requests(octo: &Octocrab, repo: &RepoId) -> Result<String> {
    let payload = GraphQlPayload {
        query: PULL_REQUESTS_QUERY,
        variables: PullRequestVars {
            owner: &repo.owner,
            name: &repo.name,
        },
    };

    let resp: serde_json::Value = octo
        .graphql(&payload)
        .await
        .map_err(|e| anyhow!("GitHub GraphQL pull-request query failed: {e:?}"))?;

    if let Some(errors) = resp.get("errors") {
        bail!("pull-request query returned errors: {errors}");
    }

    serde_json::to_string(&resp).context("failed to re-serialize GraphQL response")
}

pub fn fetch_open_pull_requests_sync(token: &str, repo: &RepoId) -> Result<String> {
    let token = token.to_owned();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to build tokio runtime: {e}"))?;

    rt.block_on(async move {
        let octo = Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(|e| anyhow!("failed to init GitHub client: {e}"))?;
        fetch_open_pull_requests(&octo, repo).await
    })
}

/// Fetch through the injected cache: serve a fresh body if there is one,
/// otherwise query GitHub and store the result before parsing.
pub fn load_open_pull_requests(
    token: &str,
    repo: &RepoId,
    cache: &dyn ResponseCache,
) -> Result<Vec<PullRequest>> {
    let key = format!("{}-{}-pulls", repo.owner, repo.name);
    let body = match cache.get(&key) {
        Some(hit) => hit,
        None => {
            tracing::debug!(%repo, "cache miss, querying GitHub");
            let body = fetch_open_pull_requests_sync(token, repo)?;
            cache.put(&key, &body)?;
            body
        }
    };
    parse_pull_requests(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_pull_request() {
        let body = r#"{
          "data": {
            "repository": {
              "pullRequests": {
                "edges": [
                  {
                    "node": {
                      "number": 42,
                      "author": { "login": "dave" },
                      "title": "Fix the frobnicator",
                      "mergeable": "MERGEABLE",
                      "commits": {
                        "edges": [
                          {
                            "node": {
                              "commit": {
                                "checkSuites": {
                                  "edges": [
                                    {
                                      "node": {
                                        "checkRuns": {
                                          "edges": [
                                            { "node": { "conclusion": "SUCCESS" } },
                                            { "node": { "conclusion": "FAILURE" } }
                                          ]
                                        }
                                      }
                                    },
                                    {
                                      "node": {
                                        "checkRuns": {
                                          "edges": [
                                            { "node": { "conclusion": "NEUTRAL" } }
                                          ]
                                        }
                                      }
                                    }
                                  ]
                                }
                              }
                            }
                          }
                        ]
                      },
                      "reviews": {
                        "nodes": [
                          {
                            "author": { "login": "alice" },
                            "state": "APPROVED",
                            "updatedAt": "2024-05-01T10:00:00Z"
                          }
                        ]
                      },
                      "participants": {
                        "edges": [
                          { "node": { "login": "alice" } },
                          { "node": { "login": "carol" } }
                        ]
                      }
                    }
                  }
                ]
              }
            }
          }
        }"#;

        let prs = parse_pull_requests(body).unwrap();
        assert_eq!(prs.len(), 1);

        let pr = &prs[0];
        assert_eq!(pr.number, 42);
        assert_eq!(pr.author, "dave");
        assert_eq!(pr.title, "Fix the frobnicator");
        assert_eq!(pr.mergeable, MergeState::Mergeable);

        // Check runs of both suites end up flattened on the one commit.
        let head = pr.head_commit().unwrap();
        let conclusions: Vec<_> = head.check_runs.iter().map(|r| r.conclusion).collect();
        assert_eq!(
            conclusions,
            vec![
                CheckConclusion::Success,
                CheckConclusion::Failure,
                CheckConclusion::Other
            ]
        );

        assert_eq!(pr.reviews.len(), 1);
        assert_eq!(pr.reviews[0].reviewer, "alice");
        assert_eq!(pr.reviews[0].verdict, ReviewVerdict::Approved);
        assert_eq!(pr.participants, vec!["alice", "carol"]);
    }

    #[test]
    fn absent_fields_default_to_empty() {
        let body = r#"{
          "data": {
            "repository": {
              "pullRequests": {
                "edges": [
                  { "node": { "number": 7 } }
                ]
              }
            }
          }
        }"#;

        let prs = parse_pull_requests(body).unwrap();
        assert_eq!(prs.len(), 1);

        let pr = &prs[0];
        assert_eq!(pr.number, 7);
        assert_eq!(pr.author, "");
        assert_eq!(pr.title, "");
        assert_eq!(pr.mergeable, MergeState::Unknown);
        assert!(pr.commits.is_empty());
        assert!(pr.reviews.is_empty());
        assert!(pr.participants.is_empty());
    }

    #[test]
    fn missing_repository_yields_no_pull_requests() {
        assert!(parse_pull_requests(r#"{"data":{"repository":null}}"#)
            .unwrap()
            .is_empty());
        assert!(parse_pull_requests(r#"{"data":null}"#).unwrap().is_empty());
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(parse_pull_requests("<html>rate limited</html>").is_err());
    }
}
