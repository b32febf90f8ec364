use anyhow::{Result, anyhow};
use octocrab::Octocrab;

/// One GitHub Actions run, reduced to what the builds table shows.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub number: u64,
    pub workflow: String,
    pub branch: String,
    pub event: String,
    /// Conclusion when the run finished, status otherwise.
    pub state: String,
}

// REST `/actions/runs` payload; fields the endpoint may omit are Options.

#[derive(Debug, serde::Deserialize)]
struct RunsResponse {
    workflow_runs: Option<Vec<RunNode>>,
}

#[derive(Debug, serde::Deserialize)]
struct RunNode {
    run_number: Option<u64>,
    name: Option<String>,
    head_branch: Option<String>,
    event: Option<String>,
    status: Option<String>,
    conclusion: Option<String>,
}

fn to_run(node: RunNode) -> WorkflowRun {
    let state = node
        .conclusion
        .or(node.status)
        .unwrap_or_else(|| "-".to_string());
    WorkflowRun {
        number: node.run_number.unwrap_or_default(),
        workflow: node.name.unwrap_or_default(),
        branch: node.head_branch.unwrap_or_default(),
        event: node.event.unwrap_or_default(),
        state,
    }
}

/// List recent workflow runs, newest first as the endpoint returns them.
pub async fn fetch_workflow_runs(
    octo: &Octocrab,
    owner: &str,
    name: &str,
    branch: Option<&str>,
) -> Result<Vec<WorkflowRun>> {
    let mut route = format!("/repos/{owner}/{name}/actions/runs?per_page=25");
    if let Some(branch) = branch {
        route.push_str(&format!("&branch={branch}"));
    }

    let resp: RunsResponse = octo
        .get(route, None::<&()>)
        .await
        .map_err(|e| anyhow!("GitHub workflow-run listing failed: {e:?}"))?;

    Ok(resp
        .workflow_runs
        .unwrap_or_default()
        .into_iter()
        .map(to_run)
        .collect())
}

pub fn fetch_workflow_runs_sync(
    token: &str,
    owner: &str,
    name: &str,
    branch: Option<&str>,
) -> Result<Vec<WorkflowRun>> {
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
        fetch_workflow_runs(&octo, owner, name, branch).await
    })
}
