//! Operation runner: validates a document, then drives the components
//! through one session in document order

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span, Instrument};

use bocactl_common::{
    validate, BocactlConfig, LoginCredential, Operation, ProvisioningDocument, ValidationError,
};

use crate::error::{AutomationError, AutomationResult};
use crate::harvester::{harvest_runs, HarvestedRun};
use crate::importer::import_users;
use crate::page::Page;
use crate::provisioner;
use crate::recording::{PlannedStep, RecordingPage};
use crate::session::Session;

/// Default harvest destination, relative to the working directory
pub const DEFAULT_HARVEST_DIR: &str = "runs";

/// What an operation did
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub operation: String,
    /// Entities submitted, in order
    pub entities: Vec<String>,
    /// Harvested runs (`harvest-runs` only)
    pub runs: Vec<HarvestedRun>,
    pub duration_ms: u64,
}

impl RunReport {
    fn new(operation: Operation) -> Self {
        Self {
            operation: operation.name().to_string(),
            entities: Vec::new(),
            runs: Vec::new(),
            duration_ms: 0,
        }
    }
}

enum Role {
    System,
    Admin,
}

/// Runs operations against one session
pub struct Runner<P: Page> {
    session: Session<P>,
    harvest_dir: PathBuf,
}

impl<P: Page> Runner<P> {
    pub fn new(session: Session<P>) -> Self {
        Self {
            session,
            harvest_dir: PathBuf::from(DEFAULT_HARVEST_DIR),
        }
    }

    /// Where `harvest-runs` writes its tree
    pub fn with_harvest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.harvest_dir = dir.into();
        self
    }

    pub fn harvest_dir(&self) -> &Path {
        &self.harvest_dir
    }

    pub fn session_mut(&mut self) -> &mut Session<P> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<P> {
        self.session
    }

    /// Validate `document` for `operation` and carry it out.
    ///
    /// Validation runs to completion before the browser is touched. UI
    /// failures abort the batch and name the entity being processed.
    pub async fn execute(
        &mut self,
        operation: Operation,
        document: &ProvisioningDocument,
    ) -> AutomationResult<RunReport> {
        validate(operation, document.value())?;

        let start = Instant::now();
        let mut report = self
            .dispatch(operation, document)
            .instrument(info_span!("operation", name = operation.name()))
            .await?;
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "{} completed: {} entit(ies), {} run(s) in {} ms",
            operation,
            report.entities.len(),
            report.runs.len(),
            report.duration_ms
        );
        Ok(report)
    }

    async fn dispatch(
        &mut self,
        operation: Operation,
        document: &ProvisioningDocument,
    ) -> AutomationResult<RunReport> {
        let mut report = RunReport::new(operation);

        match operation {
            Operation::LoginSystem => {
                self.login(operation, document, Role::System).await?;
                self.session.logout().await?;
            }
            Operation::LoginAdmin => {
                self.login(operation, document, Role::Admin).await?;
                self.session.logout().await?;
            }
            Operation::CreateContest | Operation::UpdateContest => {
                self.provision_contest(operation, document, &mut report)
                    .await?;
            }
            Operation::ClearContest => {
                let id = document.contest_ref()?.and_then(|c| c.id);
                self.login(operation, document, Role::System).await?;
                provisioner::clear_contest(&mut self.session, id).await?;
                self.session.logout().await?;
                report.entities.extend(id.map(|id| format!("contest {}", id)));
            }
            Operation::CreateUser => {
                let user = document
                    .user()?
                    .ok_or_else(|| missing(operation, "user"))?;
                self.login(operation, document, Role::Admin).await?;
                provisioner::create_user(&mut self.session, &user).await?;
                self.session.logout().await?;
                report.entities.push(format!("user {}", user.user_name));
            }
            Operation::InsertUsers => {
                let path = document
                    .user_path()
                    .ok_or_else(|| missing(operation, "userPath"))?;
                self.login(operation, document, Role::Admin).await?;
                import_users(&mut self.session, &path).await?;
                self.session.logout().await?;
                report.entities.push(format!("user list {}", path.display()));
            }
            Operation::DeleteUser => {
                let user = document.user_ref()?.unwrap_or_default();
                self.login(operation, document, Role::Admin).await?;
                provisioner::delete_user(&mut self.session, &user).await?;
                self.session.logout().await?;
                report
                    .entities
                    .extend(user.user_number.map(|n| format!("user {}", n)));
            }
            Operation::HarvestRuns => {
                self.login(operation, document, Role::Admin).await?;
                let out_dir = self.harvest_dir.clone();
                report.runs = harvest_runs(&mut self.session, &out_dir).await?;
                self.session.logout().await?;
            }
        }

        Ok(report)
    }

    /// Contest body as system, then sites, languages and problems as admin
    async fn provision_contest(
        &mut self,
        operation: Operation,
        document: &ProvisioningDocument,
        report: &mut RunReport,
    ) -> AutomationResult<()> {
        let contest = document
            .contest()?
            .ok_or_else(|| missing(operation, "contest"))?;

        self.login(operation, document, Role::System).await?;
        provisioner::provision_contest_setup(&mut self.session, &contest.setup).await?;
        report
            .entities
            .push(format!("contest {}", contest.setup.name));
        self.session.logout().await?;

        if !contest.has_contest_entities() {
            return Ok(());
        }

        self.login(operation, document, Role::Admin).await?;
        for site in &contest.sites {
            provisioner::provision_site(&mut self.session, site).await?;
            report.entities.push(format!("site {}", site.name));
        }
        for language in &contest.languages {
            provisioner::provision_language(&mut self.session, language).await?;
            report.entities.push(format!("language {}", language.name));
        }
        for problem in &contest.problems {
            provisioner::provision_problem(&mut self.session, problem).await?;
            report.entities.push(format!("problem {}", problem.name));
        }
        self.session.logout().await?;
        Ok(())
    }

    async fn login(
        &mut self,
        operation: Operation,
        document: &ProvisioningDocument,
        role: Role,
    ) -> AutomationResult<()> {
        let (credential, field): (Option<LoginCredential>, &str) = match role {
            Role::System => (document.system()?, "system"),
            Role::Admin => (document.admin()?, "admin"),
        };
        let credential = credential.ok_or_else(|| missing(operation, field))?;
        self.session
            .login(&credential)
            .await
            .map_err(|e| e.context(operation.name(), format!("login as {}", field)))
    }
}

fn missing(operation: Operation, path: &str) -> AutomationError {
    ValidationError::single(operation.name(), path, "missing").into()
}

/// Record the steps `operation` would take, without a browser
pub async fn plan(
    operation: Operation,
    document: &ProvisioningDocument,
    config: BocactlConfig,
) -> AutomationResult<Vec<PlannedStep>> {
    let mut runner = Runner::new(Session::new(RecordingPage::new(), config));
    runner.execute(operation, document).await?;
    Ok(runner.into_session().into_page().into_steps())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::UiAction;
    use bocactl_common::document::parse_yaml;

    const CONTEST: &str = r#"
system: { username: system, password: boca }
admin: { username: admin, password: boca }
contest:
  setup:
    name: Regional
    startDate: "2024-03-01 10:00"
    endDate: "2024-03-01 15:00"
    mainSiteNumber: 1
    active: false
  languages:
    - { id: 1, name: C, extension: c }
    - { id: 2, name: Java, extension: java }
"#;

    fn document(yaml: &str) -> ProvisioningDocument {
        ProvisioningDocument::from_value(parse_yaml(yaml).unwrap())
    }

    fn logins(steps: &[PlannedStep]) -> Vec<String> {
        steps
            .iter()
            .filter_map(|s| match s {
                PlannedStep::Action(UiAction::Fill { selector, value })
                    if selector == "input[name=\"name\"]" =>
                {
                    Some(value.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_contest_entities_use_admin_session() {
        let steps = plan(
            Operation::CreateContest,
            &document(CONTEST),
            BocactlConfig::default(),
        )
        .await
        .unwrap();

        // The contest form also has a `name` input.
        assert_eq!(logins(&steps), vec!["system", "Regional", "admin"]);
        assert!(steps.contains(&PlannedStep::Action(UiAction::fill(
            "input[name=\"langname\"]",
            "Java"
        ))));
    }

    #[tokio::test]
    async fn test_report_lists_entities_in_order() {
        let mut runner = Runner::new(Session::new(RecordingPage::new(), BocactlConfig::default()));
        let report = runner
            .execute(Operation::CreateContest, &document(CONTEST))
            .await
            .unwrap();

        assert_eq!(report.operation, "create-contest");
        assert_eq!(
            report.entities,
            vec!["contest Regional", "language C", "language Java"]
        );
        assert_eq!(runner.into_session().user(), None);
    }

    #[tokio::test]
    async fn test_invalid_document_never_reaches_the_page() {
        let doc = document("system: { username: system, password: boca }\n");
        let mut runner = Runner::new(Session::new(RecordingPage::new(), BocactlConfig::default()));

        let err = runner
            .execute(Operation::ClearContest, &doc)
            .await
            .unwrap_err();
        match err {
            AutomationError::Validation(e) => assert!(e.mentions("contest.setup.id")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(runner.into_session().into_page().steps().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_by_number_only() {
        let doc = document(
            "admin: { username: admin, password: boca }\nuser: { userNumber: 42, userSiteNumber: 2 }\n",
        );
        let steps = plan(Operation::DeleteUser, &doc, BocactlConfig::default())
            .await
            .unwrap();

        assert!(steps.contains(&PlannedStep::Action(UiAction::navigate(
            "http://localhost/boca/admin/user.php?site=2&user=42"
        ))));
    }

    #[tokio::test]
    async fn test_login_failure_names_the_account() {
        let page = RecordingPage::new().failing_on("input[name=\"Submit\"]");
        let mut runner = Runner::new(Session::new(page, BocactlConfig::default()));
        let doc = document("admin: { username: admin, password: boca }\n");

        let err = runner
            .execute(Operation::LoginAdmin, &doc)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "login-admin failed for login as admin: Element not found: input[name=\"Submit\"]"
        );
    }
}
