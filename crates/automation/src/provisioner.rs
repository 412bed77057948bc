//! Entity provisioning through the administrative forms
//!
//! Every entity goes through the same four steps: pick the record in the
//! entity dropdown (or the blank form), fill the fields, register the dialog
//! expectation, submit. The last two are a single [`Page::confirm`] call.

use tracing::{debug, info, info_span, warn, Instrument};

use bocactl_common::{
    date_fields, minutes, ContestSetup, Error, LanguageDescriptor, ProblemDescriptor,
    SiteDescriptor, UserDescriptor, UserRef,
};

use crate::action::{DialogOutcome, DialogPolicy, UiAction};
use crate::error::{AutomationError, AutomationResult, ResultExt};
use crate::page::{Locate, Page};
use crate::selectors::{self, button, caption, input, select, start_date, NEW_OPTION};
use crate::session::Session;

/// Site number used to look up a user when none is given
pub const DEFAULT_USER_SITE: u32 = 1;

/// Create or update the contest itself
pub async fn provision_contest_setup<P: Page>(
    session: &mut Session<P>,
    setup: &ContestSetup,
) -> AutomationResult<()> {
    let operation = if setup.id.is_some() {
        "update-contest"
    } else {
        "create-contest"
    };
    let entity = format!("contest '{}'", setup.name);

    async {
        let path = session.config().pages.contest.clone();
        session.navigate(&path).await?;
        choose_record(session.page_mut(), selectors::contest::SELECT, setup.id).await?;
        fill_contest(session.page_mut(), setup).await?;

        let submit = if setup.active {
            caption::ACTIVATE
        } else {
            caption::SEND
        };
        submit_confirmed(session.page_mut(), DialogPolicy::Accept, submit, &entity).await?;
        info!("Contest '{}' submitted", setup.name);
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("contest", name = %setup.name, id = ?setup.id))
    .await
    .context(operation, entity.as_str())
}

/// Clear an existing contest's data
pub async fn clear_contest<P: Page>(
    session: &mut Session<P>,
    contest_id: Option<u32>,
) -> AutomationResult<()> {
    let id = contest_id.ok_or(Error::MissingIdentifier {
        operation: "clear-contest",
        field: "contest.setup.id",
    })?;
    let entity = format!("contest {}", id);

    async {
        let path = session.config().pages.contest.clone();
        session.navigate(&path).await?;
        choose_record(session.page_mut(), selectors::contest::SELECT, Some(id)).await?;
        submit_confirmed(session.page_mut(), DialogPolicy::Accept, caption::CLEAR, &entity)
            .await?;
        info!("Contest {} cleared", id);
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("contest", id))
    .await
    .context("clear-contest", entity.as_str())
}

/// Create or update one site
pub async fn provision_site<P: Page>(
    session: &mut Session<P>,
    site: &SiteDescriptor,
) -> AutomationResult<()> {
    let operation = if site.id.is_some() {
        "update-site"
    } else {
        "create-site"
    };
    let entity = format!("site '{}'", site.name);

    async {
        let path = session.config().pages.site.clone();
        session.navigate(&path).await?;
        choose_record(session.page_mut(), selectors::site::SELECT, site.id).await?;
        fill_site(session.page_mut(), site).await?;
        submit_confirmed(session.page_mut(), DialogPolicy::Dismiss, caption::SEND, &entity)
            .await?;
        info!("Site '{}' submitted", site.name);
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("site", name = %site.name, id = ?site.id))
    .await
    .context(operation, entity.as_str())
}

pub async fn provision_language<P: Page>(
    session: &mut Session<P>,
    language: &LanguageDescriptor,
) -> AutomationResult<()> {
    use selectors::language::*;

    let entity = format!("language {} '{}'", language.id, language.name);

    async {
        let path = session.config().pages.language.clone();
        session.navigate(&path).await?;

        let page = session.page_mut();
        page.locate(input(NUMBER)).fill(language.id.to_string()).await?;
        page.locate(input(NAME)).fill(&language.name).await?;
        page.locate(input(EXTENSION)).fill(&language.extension).await?;
        page.locate(button(caption::SEND)).click().await?;

        info!("Language '{}' submitted", language.name);
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("language", id = language.id))
    .await
    .context("create-language", entity.as_str())
}

pub async fn provision_problem<P: Page>(
    session: &mut Session<P>,
    problem: &ProblemDescriptor,
) -> AutomationResult<()> {
    use selectors::problem::*;

    let entity = format!("problem {} '{}'", problem.id, problem.name);

    async {
        let path = session.config().pages.problem.clone();
        session.navigate(&path).await?;

        let page = session.page_mut();
        page.locate(input(NUMBER)).fill(problem.id.to_string()).await?;
        page.locate(input(NAME)).fill(&problem.name).await?;
        page.locate(input(PACKAGE))
            .set_input_files(&problem.file_path)
            .await?;
        if let Some(color_name) = &problem.color_name {
            page.locate(input(COLOR_NAME)).fill(color_name).await?;
        }
        if let Some(color_code) = &problem.color_code {
            page.locate(input(COLOR)).fill(color_code).await?;
        }
        page.locate(button(caption::SEND)).click().await?;

        info!("Problem '{}' submitted", problem.name);
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("problem", id = problem.id))
    .await
    .context("create-problem", entity.as_str())
}

pub async fn create_user<P: Page>(
    session: &mut Session<P>,
    user: &UserDescriptor,
) -> AutomationResult<()> {
    let entity = format!("user {} '{}'", user.user_number, user.user_name);

    async {
        let path = session.config().pages.user.clone();
        session.navigate(&path).await?;
        fill_user(session.page_mut(), user).await?;
        submit_confirmed(session.page_mut(), DialogPolicy::Accept, caption::SEND, &entity)
            .await?;
        info!("User '{}' submitted", user.user_name);
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("user", number = user.user_number))
    .await
    .context("create-user", entity.as_str())
}

/// Load a user by site and number, then delete it
pub async fn delete_user<P: Page>(
    session: &mut Session<P>,
    user: &UserRef,
) -> AutomationResult<()> {
    let number = user.user_number.ok_or(Error::MissingIdentifier {
        operation: "delete-user",
        field: "user.userNumber",
    })?;
    let site = user.user_site_number.unwrap_or(DEFAULT_USER_SITE);
    let entity = format!("user {} at site {}", number, site);

    async {
        let path = format!(
            "{}?site={}&user={}",
            session.config().pages.user,
            site,
            number
        );
        session.navigate(&path).await?;
        submit_confirmed(session.page_mut(), DialogPolicy::Accept, caption::DELETE, &entity)
            .await?;
        info!("User {} deleted", number);
        Ok::<_, AutomationError>(())
    }
    .instrument(info_span!("user", number, site))
    .await
    .context("delete-user", entity.as_str())
}

/// Select an existing record by id, or the blank form
async fn choose_record<P: Page>(page: &mut P, name: &str, id: Option<u32>) -> AutomationResult<()> {
    let value = id.map_or_else(|| NEW_OPTION.to_string(), |id| id.to_string());
    debug!("Selecting {}={}", name, value);
    page.locate(select(name)).select_option(value).await
}

/// Click a submit button while answering the dialog it raises
async fn submit_confirmed<P: Page>(
    page: &mut P,
    policy: DialogPolicy,
    submit: &str,
    entity: &str,
) -> AutomationResult<DialogOutcome> {
    let outcome = page.confirm(policy, &UiAction::click(button(submit))).await?;
    match &outcome {
        DialogOutcome::Resolved { message } => {
            debug!("Dialog for {} answered ({}): {}", entity, policy.as_str(), message)
        }
        DialogOutcome::NotRaised => debug!("No dialog raised for {}", entity),
        DialogOutcome::AlreadyHandled => {
            warn!("Dialog for {} was already handled before it could be answered", entity)
        }
    }
    Ok(outcome)
}

async fn fill_start_date<P: Page>(page: &mut P, start: &str) -> AutomationResult<()> {
    let fields = date_fields(start)?;
    page.locate(input(start_date::HOUR))
        .fill(fields.hour.to_string())
        .await?;
    page.locate(input(start_date::MINUTE))
        .fill(fields.minute.to_string())
        .await?;
    page.locate(input(start_date::DAY))
        .fill(fields.day.to_string())
        .await?;
    page.locate(input(start_date::MONTH))
        .fill(fields.month.to_string())
        .await?;
    page.locate(input(start_date::YEAR))
        .fill(fields.year.to_string())
        .await
}

async fn fill_contest<P: Page>(page: &mut P, setup: &ContestSetup) -> AutomationResult<()> {
    use selectors::contest::*;

    let duration = minutes(&setup.start_date, &setup.end_date)?;

    page.locate(input(NAME)).fill(&setup.name).await?;
    fill_start_date(page, &setup.start_date).await?;
    page.locate(input(DURATION)).fill(duration.to_string()).await?;
    page.locate(input(LAST_MILE_ANSWER))
        .fill(setup.stop_answering.unwrap_or(duration).to_string())
        .await?;
    page.locate(input(LAST_MILE_SCORE))
        .fill(setup.stop_scoreboard.unwrap_or(duration).to_string())
        .await?;
    page.locate(input(PENALTY))
        .fill(setup.penalty.unwrap_or(duration).to_string())
        .await?;
    if let Some(size) = setup.max_file_size {
        page.locate(input(MAX_FILE_SIZE)).fill(size.to_string()).await?;
    }
    if let Some(url) = &setup.main_site_url {
        page.locate(input(MAIN_SITE_URL)).fill(url).await?;
    }
    page.locate(input(MAIN_SITE))
        .fill(setup.main_site_number.to_string())
        .await?;
    page.locate(input(LOCAL_SITE))
        .fill(setup.local_site_number().to_string())
        .await
}

async fn fill_site<P: Page>(page: &mut P, site: &SiteDescriptor) -> AutomationResult<()> {
    use selectors::site::*;

    let duration = minutes(&site.start_date, &site.end_date)?.to_string();

    page.locate(input(NAME)).fill(&site.name).await?;
    fill_start_date(page, &site.start_date).await?;
    page.locate(input(DURATION)).fill(&duration).await?;
    page.locate(input(LAST_MILE_ANSWER)).fill(&duration).await?;
    page.locate(input(LAST_MILE_SCORE)).fill(&duration).await?;
    page.locate(input(JUDGING)).fill(&site.runs).await?;
    page.locate(input(TASKING)).fill(&site.tasks).await?;
    page.locate(input(CHIEF)).fill(&site.chief_username).await?;
    page.locate(input(ACTIVE)).set_checked(site.active).await?;
    page.locate(input(AUTO_END)).set_checked(site.auto_end).await?;
    if let Some(score) = &site.global_score {
        page.locate(input(GLOBAL_SCORE)).fill(score).await?;
    }
    if let Some(auto_judge) = site.auto_judge {
        page.locate(input(AUTO_JUDGE)).set_checked(auto_judge).await?;
    }
    if let Some(level) = &site.score_level {
        page.locate(input(SCORE_LEVEL)).fill(level).await?;
    }
    if let Some(global) = site.global_scoreboard {
        page.locate(input(GLOBAL_SCOREBOARD))
            .set_checked(global)
            .await?;
    }
    Ok(())
}

async fn fill_user<P: Page>(page: &mut P, user: &UserDescriptor) -> AutomationResult<()> {
    use selectors::user::*;

    if let Some(site) = user.user_site_number {
        page.locate(input(SITE_NUMBER)).fill(site.to_string()).await?;
    }
    page.locate(input(NUMBER))
        .fill(user.user_number.to_string())
        .await?;
    page.locate(input(NAME)).fill(&user.user_name).await?;
    if let Some(icpc_id) = &user.user_icpc_id {
        page.locate(input(ICPC_ID)).fill(icpc_id).await?;
    }
    page.locate(select(TYPE))
        .select_option(user.user_type.form_value())
        .await?;
    if let Some(enabled) = user.user_enabled {
        page.locate(select(ENABLED)).select_label(enabled.label()).await?;
    }
    if let Some(multi) = user.user_multi_login {
        page.locate(select(MULTI_LOGIN)).select_label(multi.label()).await?;
    }
    page.locate(input(FULL_NAME)).fill(&user.user_full_name).await?;
    page.locate(input(DESCRIPTION)).fill(&user.user_desc).await?;
    if let Some(ip) = &user.user_ip {
        page.locate(input(IP)).fill(ip).await?;
    }
    if let Some(password) = &user.user_password {
        page.locate(input(PASSWORD)).fill(password).await?;
        page.locate(input(PASSWORD_CONFIRM)).fill(password).await?;
    }
    if let Some(change) = user.user_change_pass {
        page.locate(select(CHANGE_PASSWORD))
            .select_label(change.label())
            .await?;
    }
    Ok(())
}
