//! Provisioning tests
//!
//! Drives whole documents through the runner against a recording page and
//! checks the resulting step sequences.

use std::fs;
use std::path::Path;

use bocactl_automation::{
    plan, AutomationError, DialogPolicy, PlannedStep, RecordingPage, Runner, Session, UiAction,
};
use bocactl_common::document::parse_yaml;
use bocactl_common::{BocactlConfig, Operation, ProvisioningDocument};
use tempfile::TempDir;

fn full_document(dir: &Path) -> ProvisioningDocument {
    let package = dir.join("A.zip");
    fs::write(&package, b"PK").unwrap();

    let yaml = format!(
        r#"
system: {{ username: system, password: boca }}
admin: {{ username: admin, password: boca }}
contest:
  setup:
    id: 1
    name: Regional 2024
    startDate: "2024-03-01 10:00"
    endDate: "2024-03-01 15:00"
    stopAnswering: 285
    maxFileSize: 100
    mainSiteNumber: 1
    localSiteNumber: 2
    active: true
  sites:
    - name: Main
      startDate: "2024-03-01 10:00"
      endDate: "2024-03-01 15:00"
      runs: 1/4
      tasks: 1/4
      chiefUsername: chief
      active: true
      autoEnd: true
  languages:
    - {{ id: 1, name: C, extension: c }}
  problems:
    - {{ id: 1, name: A, filePath: "{}", colorName: red, colorCode: FF0000 }}
"#,
        package.display()
    );
    ProvisioningDocument::from_value(parse_yaml(&yaml).unwrap())
}

fn confirms(steps: &[PlannedStep]) -> Vec<(DialogPolicy, String)> {
    steps
        .iter()
        .filter_map(|s| match s {
            PlannedStep::Confirm { policy, trigger } => {
                Some((*policy, trigger.selector().unwrap_or_default().to_string()))
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_update_contest_full_sequence() {
    let dir = TempDir::new().unwrap();
    let steps = plan(
        Operation::UpdateContest,
        &full_document(dir.path()),
        BocactlConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        confirms(&steps),
        vec![
            (
                DialogPolicy::Accept,
                "input[type=\"submit\"][value=\"Activate\"]".to_string()
            ),
            (
                DialogPolicy::Dismiss,
                "input[type=\"submit\"][value=\"Send\"]".to_string()
            ),
        ]
    );

    let actions: Vec<&UiAction> = steps.iter().filter_map(PlannedStep::action).collect();
    assert!(actions.contains(&&UiAction::select("select[name=\"contest\"]", "1")));
    assert!(actions.contains(&&UiAction::select("select[name=\"site\"]", "new")));
    assert!(actions.contains(&&UiAction::fill("input[name=\"lastmileanswer\"]", "285")));
    assert!(actions.contains(&&UiAction::fill("input[name=\"localsite\"]", "2")));
    assert!(actions.contains(&&UiAction::fill("input[name=\"color\"]", "FF0000")));

    // Sites, then languages, then problems.
    let position = |selector: &str| {
        actions
            .iter()
            .position(|a| a.selector() == Some(selector))
            .unwrap()
    };
    assert!(position("input[name=\"judging\"]") < position("input[name=\"langname\"]"));
    assert!(position("input[name=\"langname\"]") < position("input[name=\"problemname\"]"));
}

#[tokio::test]
async fn test_document_errors_are_reported_together() {
    let doc = ProvisioningDocument::from_value(
        parse_yaml(
            r#"
system: { username: system, password: boca }
contest:
  setup:
    name: Regional
    startDate: "2024-03-01 15:00"
    endDate: "2024-03-01 10:00"
    mainSiteNumber: 1
    active: true
  problems:
    - { id: 1, name: A, filePath: missing/A.zip, colorCode: red }
    - { id: 2, filePath: missing/B.zip, colorCode: ff00 }
"#,
        )
        .unwrap(),
    );

    let mut runner = Runner::new(Session::new(RecordingPage::new(), BocactlConfig::default()));
    let err = runner
        .execute(Operation::CreateContest, &doc)
        .await
        .unwrap_err();

    let AutomationError::Validation(err) = err else {
        panic!("expected a validation error, got {err}");
    };
    for path in [
        "admin",
        "contest.setup.endDate",
        "contest.problems[0].colorCode",
        "contest.problems[1].name",
        "contest.problems[1].colorCode",
    ] {
        assert!(
            err.violations.iter().any(|v| v.path.starts_with(path)),
            "no violation for {path}: {err}"
        );
    }
    assert!(runner.into_session().into_page().steps().is_empty());
}

#[tokio::test]
async fn test_insert_users_from_file() {
    let dir = TempDir::new().unwrap();
    let users = dir.path().join("users.txt");
    fs::write(&users, "[user]\nuser_number=2001\nuser_name=team2001\n").unwrap();

    let doc = ProvisioningDocument::from_value(serde_json::json!({
        "admin": { "username": "admin", "password": "boca" },
        "userPath": users,
    }));

    let steps = plan(Operation::InsertUsers, &doc, BocactlConfig::default())
        .await
        .unwrap();
    assert!(steps.contains(&PlannedStep::Action(UiAction::set_input_files(
        "input[name=\"importfile\"]",
        users.clone()
    ))));
    assert_eq!(
        confirms(&steps),
        vec![(
            DialogPolicy::Accept,
            "input[type=\"submit\"][value=\"Import\"]".to_string()
        )]
    );
}

#[tokio::test]
async fn test_ui_failure_stops_the_batch() {
    let dir = TempDir::new().unwrap();
    let page = RecordingPage::new().failing_on("input[name=\"langextension\"]");
    let mut runner = Runner::new(Session::new(page, BocactlConfig::default()));

    let err = runner
        .execute(Operation::CreateContest, &full_document(dir.path()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("language 1 'C'"));

    let steps = runner.into_session().into_page().into_steps();
    assert!(!steps
        .iter()
        .any(|s| s.action().and_then(UiAction::selector) == Some("input[name=\"problemname\"]")));
}
