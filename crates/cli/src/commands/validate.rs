//! Validate Command

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

use bocactl_common::{validate, Operation, Violation};

use super::{load_document, Context};
use crate::output::{print_error, print_list, print_success, print_value, TableDisplay};

#[derive(Args)]
pub struct ValidateArgs {
    /// Operation the document is meant for (e.g. create-contest)
    pub operation: Operation,

    /// Provisioning document (YAML, or JSON by extension)
    pub file: PathBuf,
}

#[derive(Serialize)]
struct ViolationDisplay<'a> {
    path: &'a str,
    message: &'a str,
}

impl<'a> From<&'a Violation> for ViolationDisplay<'a> {
    fn from(v: &'a Violation) -> Self {
        Self {
            path: &v.path,
            message: &v.message,
        }
    }
}

impl TableDisplay for ViolationDisplay<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Field", "Problem"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.path.to_string(), self.message.to_string()]
    }
}

pub fn execute(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let document = load_document(&args.file)?;

    match validate(args.operation, document.value()) {
        Ok(()) => {
            if ctx.format.is_human() {
                print_success(&format!(
                    "{} is valid for {}",
                    args.file.display(),
                    args.operation
                ));
            } else {
                print_value(
                    &json!({ "operation": args.operation.name(), "valid": true }),
                    ctx.format,
                );
            }
            Ok(())
        }
        Err(err) => {
            if ctx.format.is_human() {
                print_error(&format!(
                    "{} violation(s) for {}:",
                    err.violations.len(),
                    args.operation
                ));
                let rows: Vec<ViolationDisplay> = err.violations.iter().map(Into::into).collect();
                print_list(&rows, ctx.format);
            } else {
                print_value(
                    &json!({
                        "operation": args.operation.name(),
                        "valid": false,
                        "violations": err.violations,
                    }),
                    ctx.format,
                );
            }
            bail!("{} is not valid for {}", args.file.display(), args.operation)
        }
    }
}
