//! Run and Harvest Commands
//!
//! Both drive a real browser through the Playwright bridge. Ctrl-C drops the
//! session, which kills the bridge and its browser.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use bocactl_automation::runner::DEFAULT_HARVEST_DIR;
use bocactl_automation::{
    HarvestedRun, Page, PlaywrightConfig, PlaywrightPage, RunReport, Runner, Session,
};
use bocactl_common::{validate, Operation, ProvisioningDocument};

use super::{load_document, Context};
use crate::output::{
    print_info, print_list, print_success, print_value, print_warning, TableDisplay,
};

#[derive(Args)]
pub struct RunArgs {
    /// Operation to carry out (e.g. create-contest)
    pub operation: Operation,

    /// Provisioning document (YAML, or JSON by extension)
    pub file: PathBuf,

    /// Output directory for harvest-runs
    #[arg(long, default_value = DEFAULT_HARVEST_DIR)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct HarvestArgs {
    /// Document holding the admin credentials
    pub file: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = DEFAULT_HARVEST_DIR)]
    pub out: PathBuf,
}

#[derive(Serialize)]
struct RunDisplay<'a> {
    run: &'a str,
    user: &'a str,
    problem: &'a str,
    status: String,
    files: usize,
    directory: String,
}

impl<'a> From<&'a HarvestedRun> for RunDisplay<'a> {
    fn from(run: &'a HarvestedRun) -> Self {
        Self {
            run: &run.run_id,
            user: &run.username,
            problem: &run.problem,
            status: run.status.to_string(),
            files: run.files.len(),
            directory: run.directory.display().to_string(),
        }
    }
}

impl TableDisplay for RunDisplay<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Run", "User", "Problem", "Status", "Files", "Directory"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.run.to_string(),
            self.user.to_string(),
            self.problem.to_string(),
            self.status.clone(),
            self.files.to_string(),
            self.directory.clone(),
        ]
    }
}

pub async fn execute(args: RunArgs, ctx: &Context) -> Result<()> {
    let document = load_document(&args.file)?;
    let report = run_operation(ctx, args.operation, &document, &args.out).await?;
    print_report(&report, ctx);
    Ok(())
}

pub async fn harvest(args: HarvestArgs, ctx: &Context) -> Result<()> {
    let document = load_document(&args.file)?;
    let report = run_operation(ctx, Operation::HarvestRuns, &document, &args.out).await?;
    print_report(&report, ctx);
    Ok(())
}

async fn run_operation(
    ctx: &Context,
    operation: Operation,
    document: &ProvisioningDocument,
    out: &Path,
) -> Result<RunReport> {
    // Reject bad documents before starting a browser.
    validate(operation, document.value())?;

    info!("Starting {} against {}", operation, ctx.config.base_url);
    let page = PlaywrightPage::launch(PlaywrightConfig::from(&ctx.config.browser)).await?;
    let mut runner = Runner::new(Session::new(page, ctx.config.clone())).with_harvest_dir(out);

    let outcome = tokio::select! {
        result = runner.execute(operation, document) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let mut page = runner.into_session().into_page();
    let Some(result) = outcome else {
        print_warning("Interrupted, shutting down the browser");
        drop(page);
        bail!("{} interrupted", operation);
    };

    let closed = page.close().await;
    let report = result?;
    closed?;
    Ok(report)
}

fn print_report(report: &RunReport, ctx: &Context) {
    if !ctx.format.is_human() {
        print_value(report, ctx.format);
        return;
    }

    for entity in &report.entities {
        print_success(entity);
    }
    if report.operation == Operation::HarvestRuns.name() {
        let rows: Vec<RunDisplay> = report.runs.iter().map(Into::into).collect();
        print_list(&rows, ctx.format);
    }
    print_info(&format!(
        "{} finished in {} ms",
        report.operation, report.duration_ms
    ));
}
