use std::io::{self, Write};

use crate::domain::pr::{CheckConclusion, MergeState, PullRequest};
use crate::repo::github::builds::WorkflowRun;
use crate::usecase::participants::clip;

pub const PULL_REQUEST_HEADERS: [&str; 5] = ["ID", "AUTHOR", "SUMMARY", "PARTICIPANTS", "CHECK"];
pub const BUILD_HEADERS: [&str; 5] = ["RUN", "WORKFLOW", "BRANCH", "EVENT", "STATE"];

/// One-glyph summary of the head commit's check runs.
pub fn check_glyph(pr: &PullRequest) -> &'static str {
    let Some(head) = pr.head_commit() else {
        return "-";
    };
    if head.check_runs.is_empty() {
        return "-";
    }

    let mut any_success = false;
    for run in &head.check_runs {
        match run.conclusion {
            CheckConclusion::Failure | CheckConclusion::Cancelled => return "✕",
            CheckConclusion::Success => any_success = true,
            CheckConclusion::Other => {}
        }
    }
    if any_success { "✓" } else { "…" }
}

pub fn pull_request_row(pr: &PullRequest, participants: &[String]) -> Vec<String> {
    let conflict_mark = if pr.mergeable == MergeState::Conflicting {
        "[C] "
    } else {
        ""
    };
    vec![
        pr.number.to_string(),
        format!(">{}", clip(&pr.author, 12)),
        clip(&format!("{conflict_mark}{}", pr.title), 50),
        clip(&participants.join(","), 35),
        check_glyph(pr).to_string(),
    ]
}

pub fn workflow_run_row(run: &WorkflowRun) -> Vec<String> {
    vec![
        run.number.to_string(),
        clip(&run.workflow, 30),
        clip(&run.branch, 20),
        run.event.clone(),
        run.state.clone(),
    ]
}

/// Print a bordered table. Column widths follow the widest cell.
pub fn render_table(
    out: &mut impl Write,
    headers: &[&str],
    rows: &[Vec<String>],
) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let border: String = {
        let mut s = String::from("+");
        for w in &widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    };

    writeln!(out, "{border}")?;
    write_row(out, headers.iter().copied(), &widths)?;
    writeln!(out, "{border}")?;
    for row in rows {
        write_row(out, row.iter().map(String::as_str), &widths)?;
    }
    writeln!(out, "{border}")?;
    Ok(())
}

fn write_row<'a>(
    out: &mut impl Write,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> io::Result<()> {
    write!(out, "|")?;
    for (cell, w) in cells.zip(widths.iter().copied()) {
        write!(out, " {cell:<w$} |")?;
    }
    writeln!(out)
}
