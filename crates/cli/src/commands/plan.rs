//! Plan Command
//!
//! Dry run: records the steps an operation would take without a browser.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use bocactl_automation::playwright::{build_script, PlaywrightConfig};
use bocactl_automation::{plan, PlannedStep};
use bocactl_common::Operation;

use super::{load_document, Context};
use crate::output::{print_info, print_list, TableDisplay};

#[derive(Args)]
pub struct PlanArgs {
    /// Operation to plan (e.g. create-contest)
    pub operation: Operation,

    /// Provisioning document (YAML, or JSON by extension)
    pub file: PathBuf,

    /// Also write the plan as a standalone Playwright script.
    /// The script contains the document's credentials.
    #[arg(long)]
    pub script: Option<PathBuf>,
}

/// One planned step; filled values are left out
#[derive(Serialize)]
struct StepDisplay {
    index: usize,
    kind: &'static str,
    step: String,
}

impl StepDisplay {
    fn new(index: usize, step: &PlannedStep) -> Self {
        let kind = match step {
            PlannedStep::Action(_) => "action",
            PlannedStep::Confirm { .. } => "confirm",
            PlannedStep::ReadValue { .. } => "read",
            PlannedStep::ReadRows { .. } => "rows",
            PlannedStep::Download { .. } => "download",
        };
        Self {
            index,
            kind,
            step: step.to_string(),
        }
    }
}

impl TableDisplay for StepDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Kind", "Step"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.index.to_string(), self.kind.to_string(), self.step.clone()]
    }
}

pub async fn execute(args: PlanArgs, ctx: &Context) -> Result<()> {
    let document = load_document(&args.file)?;
    let steps = plan(args.operation, &document, ctx.config.clone()).await?;

    let rows: Vec<StepDisplay> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| StepDisplay::new(i + 1, step))
        .collect();
    print_list(&rows, ctx.format);

    if let Some(path) = args.script {
        let script = build_script(&PlaywrightConfig::from(&ctx.config.browser), &steps);
        std::fs::write(&path, script)
            .with_context(|| format!("Failed to write script to {}", path.display()))?;
        if ctx.format.is_human() {
            print_info(&format!("Playwright script written to {}", path.display()));
        }
    }

    Ok(())
}
