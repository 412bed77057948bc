//! bocactl browser automation
//!
//! This crate drives the BOCA administrative UI:
//! - Provisions contests, sites, languages, problems and users through forms
//! - Imports user lists in bulk
//! - Harvests submitted code and judge output from the run list
//! - Records planned steps for dry runs and exports them as Playwright scripts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Runner (one per operation)                 │
//! │    validate(document) -> login -> components -> logout      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session<P: Page>                                           │
//! │    ├── provisioner::{contest, site, language, problem,     │
//! │    │                 user create/delete}                    │
//! │    ├── importer::import_users                               │
//! │    └── harvester::harvest_runs                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page trait                                                 │
//! │    ├── PlaywrightPage  (Node.js bridge, JSON lines)         │
//! │    └── RecordingPage   (dry runs, tests)                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod error;
pub mod harvester;
pub mod importer;
pub mod page;
pub mod playwright;
pub mod provisioner;
pub mod recording;
pub mod runner;
pub mod selectors;
pub mod session;

pub use action::{DialogOutcome, DialogPolicy, TableRow, UiAction};
pub use error::{AutomationError, AutomationResult};
pub use harvester::HarvestedRun;
pub use page::{Locate, Page};
pub use playwright::{PlaywrightConfig, PlaywrightPage};
pub use recording::{PlannedStep, RecordingPage};
pub use runner::{plan, RunReport, Runner};
pub use session::Session;
