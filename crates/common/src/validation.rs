//! Per-operation contracts over provisioning documents
//!
//! A [`Contract`] is a flat set of field rules plus a few cross-field checks.
//! Operation contracts are built by union: `update-contest` is the
//! `create-contest` contract with `contest.setup.id` promoted to required,
//! `clear-contest` needs nothing but the system login and that id.
//!
//! Validation walks the untyped document and collects every violation before
//! returning, so an operator sees the full problem set in one pass.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::duration::{minutes, parse_timestamp};
use crate::error::{Error, ValidationError, Violation};
use crate::types::{scalar_text, UserType, YesNo};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[0-9a-f]{3}|[0-9a-f]{6}|[0-9a-f]{8})$").expect("valid hex color regex")
});

/// Whether `value` is a 3, 6 or 8 digit hex RGB(A) color (no leading `#`)
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

/// Operations a document can be validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoginSystem,
    LoginAdmin,
    CreateContest,
    UpdateContest,
    ClearContest,
    CreateUser,
    InsertUsers,
    DeleteUser,
    HarvestRuns,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::LoginSystem,
        Operation::LoginAdmin,
        Operation::CreateContest,
        Operation::UpdateContest,
        Operation::ClearContest,
        Operation::CreateUser,
        Operation::InsertUsers,
        Operation::DeleteUser,
        Operation::HarvestRuns,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::LoginSystem => "login-system",
            Operation::LoginAdmin => "login-admin",
            Operation::CreateContest => "create-contest",
            Operation::UpdateContest => "update-contest",
            Operation::ClearContest => "clear-contest",
            Operation::CreateUser => "create-user",
            Operation::InsertUsers => "insert-users",
            Operation::DeleteUser => "delete-user",
            Operation::HarvestRuns => "harvest-runs",
        }
    }

    /// The field contract a document must satisfy for this operation
    pub fn contract(&self) -> Contract {
        match self {
            Operation::LoginSystem => Contract::new(self.name()).with(SYSTEM_LOGIN),
            Operation::LoginAdmin => Contract::new(self.name()).with(ADMIN_LOGIN),
            Operation::CreateContest => contest_contract(self.name()),
            Operation::UpdateContest => contest_contract(self.name())
                .require("contest.setup.id", FieldKind::Integer),
            Operation::ClearContest => Contract::new(self.name())
                .with(SYSTEM_LOGIN)
                .require("contest.setup.id", FieldKind::Integer),
            Operation::CreateUser => Contract::new(self.name()).with(ADMIN_LOGIN).with(USER),
            Operation::InsertUsers => Contract::new(self.name())
                .with(ADMIN_LOGIN)
                .require("userPath", FieldKind::File),
            Operation::DeleteUser => Contract::new(self.name())
                .with(ADMIN_LOGIN)
                .require("user.userNumber", FieldKind::Integer)
                .optional("user.userSiteNumber", FieldKind::Integer),
            Operation::HarvestRuns => Contract::new(self.name()).with(ADMIN_LOGIN),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

/// Shape a field value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string
    Text,
    /// Non-negative integer
    Integer,
    Boolean,
    /// `yyyy-MM-dd HH:mm`
    Timestamp,
    /// String or number, written verbatim into a text input
    Scalar,
    HexColor,
    UserType,
    YesNo,
    /// Path to an existing file
    File,
    /// Array whose elements follow the given shape
    List(&'static Shape),
}

/// Contract for the elements of a list field
#[derive(Debug, PartialEq, Eq)]
pub struct Shape {
    pub fields: &'static [FieldRule],
    /// Start/end timestamp fields that must be ordered
    pub date_range: Option<(&'static str, &'static str)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Dotted path, relative to the document root or list element
    pub path: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

const fn req(path: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        path,
        required: true,
        kind,
    }
}

const fn opt(path: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        path,
        required: false,
        kind,
    }
}

/// Checks that relate several fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossCheck {
    /// `end` must not precede `start`
    DateOrder {
        start: &'static str,
        end: &'static str,
    },
    /// `rules` apply once any of the `lists` is non-empty
    RequiredWhenAny {
        lists: &'static [&'static str],
        rules: &'static [FieldRule],
    },
}

const SYSTEM_LOGIN: &[FieldRule] = &[
    req("system.username", FieldKind::Text),
    req("system.password", FieldKind::Text),
];

const ADMIN_LOGIN: &[FieldRule] = &[
    req("admin.username", FieldKind::Text),
    req("admin.password", FieldKind::Text),
];

const SITE: Shape = Shape {
    fields: &[
        opt("id", FieldKind::Integer),
        req("name", FieldKind::Text),
        req("startDate", FieldKind::Timestamp),
        req("endDate", FieldKind::Timestamp),
        req("runs", FieldKind::Scalar),
        req("tasks", FieldKind::Scalar),
        req("chiefUsername", FieldKind::Text),
        req("active", FieldKind::Boolean),
        req("autoEnd", FieldKind::Boolean),
        opt("globalScore", FieldKind::Scalar),
        opt("autoJudge", FieldKind::Boolean),
        opt("scoreLevel", FieldKind::Scalar),
        opt("globalScoreboard", FieldKind::Boolean),
    ],
    date_range: Some(("startDate", "endDate")),
};

const LANGUAGE: Shape = Shape {
    fields: &[
        req("id", FieldKind::Integer),
        req("name", FieldKind::Text),
        req("extension", FieldKind::Text),
    ],
    date_range: None,
};

const PROBLEM: Shape = Shape {
    fields: &[
        req("id", FieldKind::Integer),
        req("name", FieldKind::Text),
        req("filePath", FieldKind::File),
        opt("colorName", FieldKind::Text),
        opt("colorCode", FieldKind::HexColor),
    ],
    date_range: None,
};

const CONTEST_SETUP: &[FieldRule] = &[
    opt("contest.setup.id", FieldKind::Integer),
    req("contest.setup.name", FieldKind::Text),
    req("contest.setup.startDate", FieldKind::Timestamp),
    req("contest.setup.endDate", FieldKind::Timestamp),
    opt("contest.setup.stopAnswering", FieldKind::Integer),
    opt("contest.setup.stopScoreboard", FieldKind::Integer),
    opt("contest.setup.penalty", FieldKind::Integer),
    opt("contest.setup.maxFileSize", FieldKind::Integer),
    opt("contest.setup.mainSiteUrl", FieldKind::Text),
    req("contest.setup.mainSiteNumber", FieldKind::Integer),
    opt("contest.setup.localSiteNumber", FieldKind::Integer),
    req("contest.setup.active", FieldKind::Boolean),
];

const CONTEST_ENTITIES: &[FieldRule] = &[
    opt("contest.sites", FieldKind::List(&SITE)),
    opt("contest.languages", FieldKind::List(&LANGUAGE)),
    opt("contest.problems", FieldKind::List(&PROBLEM)),
];

const USER: &[FieldRule] = &[
    opt("user.userSiteNumber", FieldKind::Integer),
    req("user.userNumber", FieldKind::Integer),
    req("user.userName", FieldKind::Text),
    opt("user.userIcpcId", FieldKind::Scalar),
    req("user.userType", FieldKind::UserType),
    opt("user.userEnabled", FieldKind::YesNo),
    opt("user.userMultiLogin", FieldKind::YesNo),
    req("user.userFullName", FieldKind::Text),
    req("user.userDesc", FieldKind::Text),
    opt("user.userIp", FieldKind::Text),
    opt("user.userPassword", FieldKind::Text),
    opt("user.userChangePass", FieldKind::YesNo),
];

fn contest_contract(name: &'static str) -> Contract {
    Contract::new(name)
        .with(SYSTEM_LOGIN)
        .with(CONTEST_SETUP)
        .with(CONTEST_ENTITIES)
        .check(CrossCheck::DateOrder {
            start: "contest.setup.startDate",
            end: "contest.setup.endDate",
        })
        .check(CrossCheck::RequiredWhenAny {
            lists: &["contest.sites", "contest.languages", "contest.problems"],
            rules: ADMIN_LOGIN,
        })
}

/// Field requirements of one operation
#[derive(Debug, Clone)]
pub struct Contract {
    name: &'static str,
    rules: Vec<FieldRule>,
    checks: Vec<CrossCheck>,
}

impl Contract {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Union with another rule set. A path already present keeps the stricter rule.
    pub fn with(mut self, rules: &[FieldRule]) -> Self {
        for rule in rules {
            self.merge(*rule);
        }
        self
    }

    pub fn require(self, path: &'static str, kind: FieldKind) -> Self {
        self.with(&[req(path, kind)])
    }

    pub fn optional(self, path: &'static str, kind: FieldKind) -> Self {
        self.with(&[opt(path, kind)])
    }

    pub fn check(mut self, check: CrossCheck) -> Self {
        if !self.checks.contains(&check) {
            self.checks.push(check);
        }
        self
    }

    fn merge(&mut self, rule: FieldRule) {
        match self.rules.iter_mut().find(|r| r.path == rule.path) {
            Some(existing) => {
                existing.required |= rule.required;
                existing.kind = rule.kind;
            }
            None => self.rules.push(rule),
        }
    }

    /// Whether `path` must be present
    pub fn requires(&self, path: &str) -> bool {
        self.rules.iter().any(|r| r.path == path && r.required)
    }

    /// Whether `path` is mentioned at all
    pub fn covers(&self, path: &str) -> bool {
        self.rules.iter().any(|r| r.path == path)
    }

    /// Whether every rule of `other` is also enforced, at least as strictly, here
    pub fn includes(&self, other: &Contract) -> bool {
        other.rules.iter().all(|theirs| {
            self.rules
                .iter()
                .any(|ours| ours.path == theirs.path && (ours.required || !theirs.required))
        }) && other.checks.iter().all(|c| self.checks.contains(c))
    }

    /// Validate a document, collecting every violation
    pub fn validate(&self, document: &Value) -> Result<(), ValidationError> {
        let mut ctx = ValidationContext::new();

        check_rules(document, "", &self.rules, &mut ctx);

        for check in &self.checks {
            match check {
                CrossCheck::DateOrder { start, end } => {
                    check_date_order(document, "", start, end, &mut ctx)
                }
                CrossCheck::RequiredWhenAny { lists, rules } => {
                    let triggered = lists.iter().any(|path| {
                        lookup(document, path)
                            .and_then(Value::as_array)
                            .map(|items| !items.is_empty())
                            .unwrap_or(false)
                    });
                    if triggered {
                        check_rules(document, "", rules, &mut ctx);
                    }
                }
            }
        }

        debug!(
            "Validated document for {}: {} violation(s)",
            self.name,
            ctx.violations.len()
        );
        ctx.finish(self.name)
    }
}

/// Validate `document` for `operation`
pub fn validate(operation: Operation, document: &Value) -> Result<(), ValidationError> {
    operation.contract().validate(document)
}

struct ValidationContext {
    violations: Vec<Violation>,
}

impl ValidationContext {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    fn error(&mut self, path: String, message: impl Into<String>) {
        let violation = Violation::new(path, message);
        if !self.violations.contains(&violation) {
            self.violations.push(violation);
        }
    }

    fn finish(self, operation: &str) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(operation, self.violations))
        }
    }
}

fn join(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{}.{}", prefix, path)
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .filter(|v| !v.is_null())
}

fn check_rules(base: &Value, prefix: &str, rules: &[FieldRule], ctx: &mut ValidationContext) {
    for rule in rules {
        let location = join(prefix, rule.path);
        match lookup(base, rule.path) {
            None if rule.required => ctx.error(location, "missing"),
            None => {}
            Some(value) => check_kind(value, &location, rule.kind, ctx),
        }
    }
}

fn check_kind(value: &Value, location: &str, kind: FieldKind, ctx: &mut ValidationContext) {
    match kind {
        FieldKind::Text => match value.as_str() {
            Some(s) if !s.trim().is_empty() => {}
            Some(_) => ctx.error(location.to_string(), "cannot be empty"),
            None => ctx.error(location.to_string(), "must be a string"),
        },
        FieldKind::Integer => {
            if value.as_u64().is_none() {
                ctx.error(location.to_string(), "must be a non-negative integer");
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                ctx.error(location.to_string(), "must be true or false");
            }
        }
        FieldKind::Timestamp => match value.as_str() {
            Some(s) if parse_timestamp(s).is_ok() => {}
            _ => ctx.error(
                location.to_string(),
                "must be a timestamp formatted as yyyy-MM-dd HH:mm",
            ),
        },
        FieldKind::Scalar => {
            if scalar_text(value).is_none() {
                ctx.error(location.to_string(), "must be a string or number");
            }
        }
        FieldKind::HexColor => match scalar_text(value) {
            Some(s) if is_hex_color(&s) => {}
            _ => ctx.error(
                location.to_string(),
                "must be a 3, 6 or 8 digit hex color",
            ),
        },
        FieldKind::UserType => match value.as_str().map(str::parse::<UserType>) {
            Some(Ok(_)) => {}
            _ => ctx.error(
                location.to_string(),
                "must be one of Team, Judge, Admin, Staff, Score, Site",
            ),
        },
        FieldKind::YesNo => {
            let ok = value.is_boolean()
                || value
                    .as_str()
                    .map(|s| s.parse::<YesNo>().is_ok())
                    .unwrap_or(false);
            if !ok {
                ctx.error(location.to_string(), "must be yes or no");
            }
        }
        FieldKind::File => match value.as_str() {
            Some(s) if s.trim().is_empty() => ctx.error(location.to_string(), "cannot be empty"),
            Some(s) if Path::new(s).is_file() => {}
            Some(s) => ctx.error(location.to_string(), format!("file '{}' does not exist", s)),
            None => ctx.error(location.to_string(), "must be a file path"),
        },
        FieldKind::List(shape) => match value.as_array() {
            Some(items) => {
                for (index, item) in items.iter().enumerate() {
                    let element = format!("{}[{}]", location, index);
                    if !item.is_object() {
                        ctx.error(element, "must be a mapping");
                        continue;
                    }
                    check_rules(item, &element, shape.fields, ctx);
                    if let Some((start, end)) = shape.date_range {
                        check_date_order(item, &element, start, end, ctx);
                    }
                }
            }
            None => ctx.error(location.to_string(), "must be a list"),
        },
    }
}

fn check_date_order(base: &Value, prefix: &str, start: &str, end: &str, ctx: &mut ValidationContext) {
    let (Some(start_value), Some(end_value)) = (
        lookup(base, start).and_then(Value::as_str),
        lookup(base, end).and_then(Value::as_str),
    ) else {
        return;
    };

    // Unparseable timestamps are already reported by the field rules.
    if let Ok(delta) = minutes(start_value, end_value) {
        if delta < 0 {
            ctx.error(join(prefix, end), format!("must not be before {}", start));
        }
    }
}
