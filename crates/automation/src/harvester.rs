//! Run report harvesting
//!
//! Walks the admin run list and, for every run, stores the submitted code and
//! (once judged) the execution output under
//! `<out>/<username>/<problem>/<run>_<YES|NO>/`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, info_span, warn, Instrument};

use bocactl_common::{HarvestLayout, RunStatus};

use crate::action::{TableRow, UiAction};
use crate::error::{AutomationError, AutomationResult, ResultExt};
use crate::page::{Locate, Page};
use crate::selectors::link;
use crate::session::Session;

static RUN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("valid run number regex"));

pub const STDOUT_FILE: &str = "stdout.txt";
pub const STDERR_FILE: &str = "stderr.txt";

/// A run discovered on the list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub link: String,
    pub username: String,
    pub problem: String,
    pub run_id: String,
}

/// What was stored for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestedRun {
    pub run_id: String,
    pub username: String,
    pub problem: String,
    pub status: RunStatus,
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Rows of the run table that describe a run, in page order
pub fn list_runs(rows: &[TableRow], layout: &HarvestLayout) -> Vec<RunRecord> {
    rows.iter()
        .filter_map(|row| {
            let run_id = row.cell(layout.run_column)?;
            if !RUN_NUMBER.is_match(run_id) {
                return None;
            }
            let link = row
                .link(layout.run_column)
                .or_else(|| row.links.iter().flatten().next().map(String::as_str));
            let Some(link) = link else {
                warn!("Run {} has no link, skipping", run_id);
                return None;
            };
            Some(RunRecord {
                link: link.to_string(),
                username: row.cell(layout.user_column).unwrap_or_default().to_string(),
                problem: row.cell(layout.problem_column).unwrap_or_default().to_string(),
                run_id: run_id.to_string(),
            })
        })
        .collect()
}

/// Map a status select value onto the judgment table
pub fn decode_status(run_id: &str, raw: &str) -> AutomationResult<RunStatus> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(RunStatus::from_index)
        .ok_or_else(|| AutomationError::StatusOutOfRange {
            run: run_id.to_string(),
            value: raw.to_string(),
        })
}

/// `<out>/<username>/<problem>/<run>_<YES|NO>`.
///
/// Username and problem come from the run table and must each be a single
/// plain directory name.
pub fn run_output_dir(
    out_dir: &Path,
    username: &str,
    problem: &str,
    run_id: &str,
    status: RunStatus,
) -> AutomationResult<PathBuf> {
    let username = path_segment(run_id, "username", username)?;
    let problem = path_segment(run_id, "problem", problem)?;
    Ok(out_dir
        .join(username)
        .join(problem)
        .join(format!("{}_{}", run_id, status.coarse_label())))
}

fn path_segment<'a>(
    run_id: &str,
    field: &'static str,
    value: &'a str,
) -> AutomationResult<&'a str> {
    let mut components = Path::new(value).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single && !value.contains(|c: char| c == '/' || c == '\\') {
        Ok(value)
    } else {
        Err(AutomationError::UnsafePathSegment {
            run: run_id.to_string(),
            field,
            value: value.to_string(),
        })
    }
}

/// Harvest every run on the list page. The first failure aborts the rest.
pub async fn harvest_runs<P: Page>(
    session: &mut Session<P>,
    out_dir: &Path,
) -> AutomationResult<Vec<HarvestedRun>> {
    let layout = session.config().harvest.clone();
    let runs_page = session.config().pages.runs.clone();

    session
        .navigate(&runs_page)
        .await
        .context("harvest-runs", "run list")?;
    let rows = session
        .page_mut()
        .table_rows(&layout.row_selector)
        .await
        .context("harvest-runs", "run list")?;
    let records = list_runs(&rows, &layout);
    info!("Found {} run(s) to harvest", records.len());

    let mut harvested = Vec::with_capacity(records.len());
    for record in records {
        let entity = format!("run {}", record.run_id);
        let run = harvest_run(session.page_mut(), &layout, &record, out_dir)
            .instrument(info_span!("run", id = %record.run_id, user = %record.username))
            .await
            .context("harvest-runs", entity)?;
        harvested.push(run);
    }

    info!("Harvested {} run(s) into {}", harvested.len(), out_dir.display());
    Ok(harvested)
}

async fn harvest_run<P: Page>(
    page: &mut P,
    layout: &HarvestLayout,
    record: &RunRecord,
    out_dir: &Path,
) -> AutomationResult<HarvestedRun> {
    page.locate(link(&record.link)).click().await?;

    let raw = page
        .locate(layout.status_selector.as_str())
        .input_value()
        .await?;
    let status = decode_status(&record.run_id, &raw)?;
    debug!("Run {} status {} ({})", record.run_id, status.index(), status);

    let directory = run_output_dir(
        out_dir,
        &record.username,
        &record.problem,
        &record.run_id,
        status,
    )?;
    tokio::fs::create_dir_all(&directory).await?;

    let mut files = vec![
        page.download(&UiAction::click(&layout.code_link), &directory, None)
            .await?,
    ];
    if status.is_judged() {
        files.push(
            page.download(
                &UiAction::click(&layout.stdout_link),
                &directory,
                Some(STDOUT_FILE),
            )
            .await?,
        );
        files.push(
            page.download(
                &UiAction::click(&layout.stderr_link),
                &directory,
                Some(STDERR_FILE),
            )
            .await?,
        );
    }

    page.perform(&UiAction::GoBack).await?;

    Ok(HarvestedRun {
        run_id: record.run_id.clone(),
        username: record.username.clone(),
        problem: record.problem.clone(),
        status,
        directory,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{PlannedStep, RecordingPage};
    use bocactl_common::BocactlConfig;
    use test_case::test_case;

    fn row(run: &str, user: &str, problem: &str) -> TableRow {
        TableRow {
            cells: vec![
                run.into(),
                "1".into(),
                user.into(),
                "10".into(),
                problem.into(),
            ],
            links: vec![Some(format!("runedit.php?run={}", run)), None, None, None, None],
        }
    }

    #[test_case("0", RunStatus::NotAnswered ; "not answered")]
    #[test_case("1", RunStatus::Yes ; "accepted")]
    #[test_case("2", RunStatus::CompilationError ; "compilation")]
    #[test_case(" 8 ", RunStatus::NameMismatch ; "last entry trimmed")]
    fn test_decode_status(raw: &str, expected: RunStatus) {
        assert_eq!(decode_status("7", raw).unwrap(), expected);
    }

    #[test_case("9" ; "past the table")]
    #[test_case("-1" ; "negative")]
    #[test_case("" ; "empty")]
    fn test_decode_status_rejects(raw: &str) {
        let err = decode_status("7", raw).unwrap_err();
        assert!(matches!(err, AutomationError::StatusOutOfRange { run, .. } if run == "7"));
    }

    #[test]
    fn test_list_keeps_numbered_rows() {
        let header = TableRow {
            cells: vec!["Run #".into(), "Site".into(), "User".into()],
            links: vec![None, None, None],
        };
        let unlinked = TableRow {
            cells: vec!["9".into()],
            links: vec![None],
        };
        let rows = vec![header, row("7", "alice", "A"), unlinked, row("12", "bob", "B")];

        let records = list_runs(&rows, &HarvestLayout::default());
        assert_eq!(
            records,
            vec![
                RunRecord {
                    link: "runedit.php?run=7".into(),
                    username: "alice".into(),
                    problem: "A".into(),
                    run_id: "7".into(),
                },
                RunRecord {
                    link: "runedit.php?run=12".into(),
                    username: "bob".into(),
                    problem: "B".into(),
                    run_id: "12".into(),
                },
            ]
        );
    }

    #[test]
    fn test_output_dir_uses_coarse_label() {
        let out = Path::new("out");
        assert_eq!(
            run_output_dir(out, "alice", "A", "7", RunStatus::CompilationError).unwrap(),
            Path::new("out/alice/A/7_NO")
        );
        assert_eq!(
            run_output_dir(out, "alice", "A", "7", RunStatus::NotAnswered).unwrap(),
            Path::new("out/alice/A/7_NO")
        );
        assert_eq!(
            run_output_dir(out, "alice", "A", "7", RunStatus::Yes).unwrap(),
            Path::new("out/alice/A/7_YES")
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("." ; "current dir")]
    #[test_case(".." ; "parent dir")]
    #[test_case("../../escaped" ; "relative escape")]
    #[test_case("/etc" ; "absolute")]
    #[test_case("alice/" ; "trailing slash")]
    #[test_case("a/b" ; "nested")]
    #[test_case("a\\b" ; "backslash")]
    fn test_output_dir_rejects_unsafe_names(name: &str) {
        let out = Path::new("out");

        let err = run_output_dir(out, name, "A", "7", RunStatus::Yes).unwrap_err();
        assert!(matches!(
            err,
            AutomationError::UnsafePathSegment { ref run, field: "username", ref value }
                if run == "7" && value == name
        ));

        let err = run_output_dir(out, "alice", name, "7", RunStatus::Yes).unwrap_err();
        assert!(matches!(
            err,
            AutomationError::UnsafePathSegment { field: "problem", .. }
        ));
    }

    fn harvest_page(status: &str) -> RecordingPage {
        let layout = HarvestLayout::default();
        RecordingPage::new()
            .writing_downloads()
            .with_rows(layout.row_selector.clone(), vec![row("7", "alice", "A")])
            .with_value(layout.status_selector.clone(), status)
            .with_download_name(layout.code_link.clone(), "main.c")
    }

    #[tokio::test]
    async fn test_judged_run_gets_output_files() {
        let out = tempfile::tempdir().unwrap();
        let mut session = Session::new(harvest_page("2"), BocactlConfig::default());

        let runs = harvest_runs(&mut session, out.path()).await.unwrap();

        let dir = out.path().join("alice/A/7_NO");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::CompilationError);
        assert_eq!(runs[0].directory, dir);
        assert_eq!(
            runs[0].files,
            vec![dir.join("main.c"), dir.join("stdout.txt"), dir.join("stderr.txt")]
        );
        assert!(dir.join("stderr.txt").is_file());

        let steps = session.into_page().into_steps();
        assert_eq!(steps.last(), Some(&PlannedStep::Action(UiAction::GoBack)));
    }

    #[tokio::test]
    async fn test_unjudged_run_gets_code_only() {
        let out = tempfile::tempdir().unwrap();
        let mut session = Session::new(harvest_page("0"), BocactlConfig::default());

        let runs = harvest_runs(&mut session, out.path()).await.unwrap();

        let dir = out.path().join("alice/A/7_NO");
        assert_eq!(runs[0].files, vec![dir.join("main.c")]);
        assert!(dir.join("main.c").is_file());
        assert!(!dir.join("stdout.txt").exists());
    }

    #[tokio::test]
    async fn test_out_of_range_status_aborts() {
        let out = tempfile::tempdir().unwrap();
        let mut session = Session::new(harvest_page("9"), BocactlConfig::default());

        let err = harvest_runs(&mut session, out.path()).await.unwrap_err();

        assert!(err.to_string().starts_with("harvest-runs failed for run 7"));
        assert!(matches!(err.root(), AutomationError::StatusOutOfRange { .. }));
        assert!(!out.path().join("alice").exists());
    }

    #[tokio::test]
    async fn test_escaping_username_aborts_without_writing() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        let layout = HarvestLayout::default();
        let page = harvest_page("1").with_rows(
            layout.row_selector.clone(),
            vec![row("7", "../../escaped", "A")],
        );
        let mut session = Session::new(page, BocactlConfig::default());

        let err = harvest_runs(&mut session, &out).await.unwrap_err();

        assert!(err.to_string().starts_with("harvest-runs failed for run 7"));
        assert!(matches!(err.root(), AutomationError::UnsafePathSegment { .. }));
        assert!(!root.path().join("escaped").exists());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_existing_directory_is_reused() {
        let out = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(out.path().join("alice/A/7_YES")).unwrap();
        let mut session = Session::new(harvest_page("1"), BocactlConfig::default());

        let runs = harvest_runs(&mut session, out.path()).await.unwrap();
        assert_eq!(runs[0].directory, out.path().join("alice/A/7_YES"));
        assert_eq!(runs[0].files.len(), 3);
    }
}
