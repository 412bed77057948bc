//! Playwright browser automation
//!
//! Rust talks to a long-lived Node.js process running `bridge.js`: one JSON
//! request per line on its stdin, one JSON response per line on its stdout.
//! The page stays open between requests, so dropdown selections, history and
//! the login cookie persist across provisioning steps.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use bocactl_common::config::{BrowserConfig, BrowserKind};

use crate::action::{DialogOutcome, DialogPolicy, TableRow, UiAction};
use crate::error::{AutomationError, AutomationResult};
use crate::page::Page;
use crate::recording::PlannedStep;

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

/// Added to the in-browser timeout when waiting for a bridge reply
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub operation_timeout: Duration,
    pub node_binary: String,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for PlaywrightConfig {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            browser: config.kind,
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            operation_timeout: Duration::from_secs(config.operation_timeout_secs),
            node_binary: config.node_binary.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Playwright browser handle
pub struct PlaywrightPage {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    operation_timeout: Duration,
    closed: bool,

    /// Holds the staged bridge script for the lifetime of the process
    _script_dir: tempfile::TempDir,
}

impl PlaywrightPage {
    /// Start the bridge process and open a browser page
    pub async fn launch(config: PlaywrightConfig) -> AutomationResult<Self> {
        Self::check_node_installed(&config.node_binary).await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        tokio::fs::write(&script_path, BRIDGE_SCRIPT).await?;

        debug!("Starting Playwright bridge: {}", script_path.display());

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .env("NODE_PATH", node_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AutomationError::Bridge(format!("failed to spawn bridge: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AutomationError::Bridge("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AutomationError::Bridge("bridge stdout unavailable".into()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "bocactl::bridge", "{}", line);
                }
            });
        }

        let mut page = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            operation_timeout: config.operation_timeout,
            closed: false,
            _script_dir: script_dir,
        };

        let launched = page
            .request(
                json!({
                    "op": "launch",
                    "browser": config.browser.as_str(),
                    "headless": config.headless,
                    "width": config.viewport_width,
                    "height": config.viewport_height,
                    "timeoutMs": config.operation_timeout.as_millis() as u64,
                }),
                "browser launch",
            )
            .await?;

        info!(
            "Browser ready: {} {}",
            config.browser,
            launched["version"].as_str().unwrap_or("(unknown version)")
        );
        Ok(page)
    }

    /// Check that Node.js can be executed
    async fn check_node_installed(node: &str) -> AutomationResult<()> {
        let status = Command::new(node)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(AutomationError::NodeNotFound(node.to_string())),
        }
    }

    async fn request(&mut self, mut payload: Value, what: &str) -> AutomationResult<Value> {
        if self.closed {
            return Err(AutomationError::Bridge("page already closed".into()));
        }

        self.next_id += 1;
        let id = self.next_id;
        payload["id"] = json!(id);

        let mut line = serde_json::to_string(&payload)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let wait = self.operation_timeout + RESPONSE_GRACE;
        loop {
            let next = timeout(wait, self.stdout.next_line())
                .await
                .map_err(|_| AutomationError::Timeout {
                    what: what.to_string(),
                    seconds: wait.as_secs(),
                })??;

            let Some(raw) = next else {
                let status = self.child.try_wait().ok().flatten();
                return Err(AutomationError::Bridge(format!(
                    "bridge exited while waiting for {} ({})",
                    what,
                    status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "still running".to_string())
                )));
            };

            let response: BridgeResponse = match serde_json::from_str(&raw) {
                Ok(response) => response,
                Err(_) => {
                    warn!("Ignoring unexpected bridge output: {}", raw);
                    continue;
                }
            };

            if response.id != Some(id) {
                warn!("Ignoring stale bridge response {:?}", response.id);
                continue;
            }

            return if response.ok {
                Ok(response.value)
            } else {
                Err(bridge_error(response, what, self.operation_timeout))
            };
        }
    }
}

/// Map a failed bridge reply onto the error for `what`
fn bridge_error(response: BridgeResponse, what: &str, limit: Duration) -> AutomationError {
    let reason = response.error.unwrap_or_else(|| "unknown error".to_string());
    match response.kind.as_deref() {
        Some("timeout") => AutomationError::Timeout {
            what: what.to_string(),
            seconds: limit.as_secs(),
        },
        Some("download_timeout") => AutomationError::DownloadTimeout(what.to_string()),
        Some("not_found") => AutomationError::ElementNotFound(what.to_string()),
        Some("navigation") => AutomationError::Navigation {
            url: what.to_string(),
            reason,
        },
        _ => AutomationError::StepFailed {
            step: what.to_string(),
            reason,
        },
    }
}

/// Module search path for the bridge: inherited `NODE_PATH` plus the
/// working directory's `node_modules`
fn node_path() -> String {
    let mut paths: Vec<PathBuf> = std::env::var_os("NODE_PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("node_modules"));
    }
    std::env::join_paths(paths)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn perform(&mut self, action: &UiAction) -> AutomationResult<()> {
        debug!("Executing step: {}", action);
        let what = action.to_string();
        self.request(json!({ "op": "perform", "action": action }), &what)
            .await?;
        Ok(())
    }

    async fn confirm(
        &mut self,
        policy: DialogPolicy,
        trigger: &UiAction,
    ) -> AutomationResult<DialogOutcome> {
        debug!("Executing step: {} (dialog: {})", trigger, policy.as_str());
        let what = trigger.to_string();
        let value = self
            .request(
                json!({ "op": "confirm", "policy": policy, "trigger": trigger }),
                &what,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn input_value(&mut self, selector: &str) -> AutomationResult<String> {
        let value = self
            .request(json!({ "op": "input_value", "selector": selector }), selector)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn table_rows(&mut self, selector: &str) -> AutomationResult<Vec<TableRow>> {
        let value = self
            .request(json!({ "op": "table_rows", "selector": selector }), selector)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn download(
        &mut self,
        trigger: &UiAction,
        dir: &Path,
        file_name: Option<&str>,
    ) -> AutomationResult<PathBuf> {
        debug!("Downloading via {} into {}", trigger, dir.display());
        let what = trigger.to_string();
        let result = self
            .request(
                json!({
                    "op": "download",
                    "trigger": trigger,
                    "dir": dir,
                    "fileName": file_name,
                }),
                &what,
            )
            .await;

        match result {
            Ok(value) => value
                .as_str()
                .map(PathBuf::from)
                .ok_or_else(|| AutomationError::Bridge("download returned no path".into())),
            Err(AutomationError::Timeout { .. }) => Err(AutomationError::DownloadTimeout(what)),
            Err(e) => Err(e),
        }
    }

    async fn close(&mut self) -> AutomationResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.request(json!({ "op": "close" }), "browser close").await;
        self.closed = true;
        if let Err(e) = &result {
            warn!("Browser did not close cleanly: {}", e);
            let _ = self.child.start_kill();
        }
        result.map(|_| ())
    }
}

/// Render recorded steps as a standalone Playwright script.
///
/// The output mirrors what the bridge would execute, so a dry-run plan can be
/// replayed or inspected with plain `node`.
pub fn build_script(config: &PlaywrightConfig, steps: &[PlannedStep]) -> String {
    let mut script = String::new();

    script.push_str(&format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    acceptDownloads: true,
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});

  try {{
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
        timeout = config.operation_timeout.as_millis(),
    ));

    for (i, step) in steps.iter().enumerate() {
        script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step));
        script.push_str(&step_to_js(step));
        script.push('\n');
    }

    script.push_str(
        r#"
    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.error(JSON.stringify({ success: false, error: error.message, stack: error.stack }));
    process.exit(1);
  } finally {
    await browser.close();
  }
})();
"#,
    );

    script
}

/// Quote a string as a JavaScript literal
fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "''".to_string())
}

/// Playwright call performing `action`, without the leading `await`
fn action_call(action: &UiAction) -> String {
    match action {
        UiAction::Navigate { url } => format!("page.goto({})", js_str(url)),
        UiAction::Click { selector } => format!("page.click({})", js_str(selector)),
        UiAction::Fill { selector, value } => {
            format!("page.fill({}, {})", js_str(selector), js_str(value))
        }
        UiAction::Check { selector } => format!("page.check({})", js_str(selector)),
        UiAction::Uncheck { selector } => format!("page.uncheck({})", js_str(selector)),
        UiAction::Select { selector, value } => format!(
            "page.selectOption({}, {{ value: {} }})",
            js_str(selector),
            js_str(value)
        ),
        UiAction::SelectLabel { selector, label } => format!(
            "page.selectOption({}, {{ label: {} }})",
            js_str(selector),
            js_str(label)
        ),
        UiAction::SetInputFiles { selector, path } => format!(
            "page.setInputFiles({}, {})",
            js_str(selector),
            js_str(&path.to_string_lossy())
        ),
        UiAction::GoBack => "page.goBack()".to_string(),
    }
}

fn action_to_js(action: &UiAction) -> String {
    format!(
        "    await {};\n    await page.waitForLoadState('load');",
        action_call(action)
    )
}

fn step_to_js(step: &PlannedStep) -> String {
    match step {
        PlannedStep::Action(action) => action_to_js(action),
        PlannedStep::Confirm { policy, trigger } => format!(
            "    page.once('dialog', (dialog) => dialog.{}().catch(() => {{}}));\n{}",
            policy.as_str(),
            action_to_js(trigger)
        ),
        PlannedStep::ReadValue { selector } => format!(
            "    console.log({} + ' = ' + await page.inputValue({}));",
            js_str(selector),
            js_str(selector)
        ),
        PlannedStep::ReadRows { selector } => format!(
            "    console.log(await page.locator({}).count() + ' rows');",
            js_str(selector)
        ),
        PlannedStep::Download {
            trigger,
            dir,
            file_name,
        } => {
            let target = match file_name {
                Some(name) => js_str(&dir.join(name).to_string_lossy()),
                None => format!(
                    "{} + '/' + download.suggestedFilename()",
                    js_str(&dir.to_string_lossy())
                ),
            };
            format!(
                "    {{\n      const [download] = await Promise.all([page.waitForEvent('download'), {}]);\n      await download.saveAs({});\n    }}",
                action_call(trigger),
                target
            )
        }
    }
}
