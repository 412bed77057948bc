//! Bulk user import

use std::path::Path;
use tracing::{info, info_span, warn, Instrument};

use bocactl_common::ValidationError;

use crate::action::{DialogOutcome, DialogPolicy, UiAction};
use crate::error::{AutomationError, AutomationResult, ResultExt};
use crate::page::{Locate, Page};
use crate::selectors::{button, caption, input, user};
use crate::session::Session;

/// Upload a user list through the import form.
///
/// The file is passed through untouched; a missing file is rejected before
/// the browser is touched.
pub async fn import_users<P: Page>(session: &mut Session<P>, path: &Path) -> AutomationResult<()> {
    if !path.is_file() {
        return Err(ValidationError::single(
            "insert-users",
            "userPath",
            format!("file '{}' does not exist", path.display()),
        )
        .into());
    }
    let entity = path.display().to_string();

    async {
        let users_page = session.config().pages.user.clone();
        session.navigate(&users_page).await?;

        let page = session.page_mut();
        page.locate(input(user::IMPORT_FILE))
            .set_input_files(path)
            .await?;
        let outcome = page
            .confirm(DialogPolicy::Accept, &UiAction::click(button(caption::IMPORT)))
            .await?;
        if outcome == DialogOutcome::AlreadyHandled {
            warn!("Import dialog was already handled before it could be answered");
        }

        info!("Imported users from {}", path.display());
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("import", file = %entity))
    .await
    .context("insert-users", entity.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{PlannedStep, RecordingPage};
    use bocactl_common::BocactlConfig;

    #[tokio::test]
    async fn test_missing_file_fails_before_any_ui() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(RecordingPage::new(), BocactlConfig::default());

        let err = import_users(&mut session, &dir.path().join("users.txt"))
            .await
            .unwrap_err();
        match err {
            AutomationError::Validation(e) => assert!(e.mentions("userPath")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(session.into_page().steps().is_empty());
    }

    #[tokio::test]
    async fn test_import_attaches_file_and_accepts() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("users.txt");
        std::fs::write(&file, "[user]\nuser_number=2001\n").unwrap();

        let mut session = Session::new(RecordingPage::new(), BocactlConfig::default());
        import_users(&mut session, &file).await.unwrap();
        let steps = session.into_page().into_steps();

        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[1],
            PlannedStep::Action(UiAction::set_input_files(
                "input[name=\"importfile\"]",
                file.clone()
            ))
        );
        assert_eq!(
            steps[2],
            PlannedStep::Confirm {
                policy: DialogPolicy::Accept,
                trigger: UiAction::click(button("Import")),
            }
        );
    }
}
