//! Core types for bocactl
//!
//! Descriptors mirror the provisioning document (camelCase keys). They are
//! only built after the document passed validation, so the typed layer does
//! not repeat per-field checks.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Credentials used to open a session; never persisted
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A contest together with everything provisioned inside it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestDescriptor {
    pub setup: ContestSetup,
    #[serde(default)]
    pub sites: Vec<SiteDescriptor>,
    #[serde(default)]
    pub languages: Vec<LanguageDescriptor>,
    #[serde(default)]
    pub problems: Vec<ProblemDescriptor>,
}

impl ContestDescriptor {
    /// Whether provisioning needs an admin session after the contest itself
    pub fn has_contest_entities(&self) -> bool {
        !(self.sites.is_empty() && self.languages.is_empty() && self.problems.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestSetup {
    /// Absent creates a new contest, present selects an existing one
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub stop_answering: Option<i64>,
    #[serde(default)]
    pub stop_scoreboard: Option<i64>,
    #[serde(default)]
    pub penalty: Option<i64>,
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub main_site_url: Option<String>,
    pub main_site_number: u32,
    #[serde(default)]
    pub local_site_number: Option<u32>,
    pub active: bool,
}

impl ContestSetup {
    pub fn local_site_number(&self) -> u32 {
        self.local_site_number.unwrap_or(self.main_site_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDescriptor {
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(deserialize_with = "scalar")]
    pub runs: String,
    #[serde(deserialize_with = "scalar")]
    pub tasks: String,
    pub chief_username: String,
    pub active: bool,
    pub auto_end: bool,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub global_score: Option<String>,
    #[serde(default)]
    pub auto_judge: Option<bool>,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub score_level: Option<String>,
    #[serde(default)]
    pub global_scoreboard: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDescriptor {
    pub id: u32,
    pub name: String,
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDescriptor {
    pub id: u32,
    pub name: String,
    pub file_path: String,
    #[serde(default)]
    pub color_name: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub color_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDescriptor {
    #[serde(default)]
    pub user_site_number: Option<u32>,
    pub user_number: u32,
    pub user_name: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub user_icpc_id: Option<String>,
    pub user_type: UserType,
    #[serde(default)]
    pub user_enabled: Option<YesNo>,
    #[serde(default)]
    pub user_multi_login: Option<YesNo>,
    pub user_full_name: String,
    pub user_desc: String,
    #[serde(default)]
    pub user_ip: Option<String>,
    #[serde(default)]
    pub user_password: Option<String>,
    #[serde(default)]
    pub user_change_pass: Option<YesNo>,
}

/// Identifying part of a contest setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContestRef {
    #[serde(default)]
    pub id: Option<u32>,
}

/// Identifying part of a user, enough to find the account for deletion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(default)]
    pub user_site_number: Option<u32>,
    #[serde(default)]
    pub user_number: Option<u32>,
}

/// Account role of a contest user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UserType {
    Team,
    Judge,
    Admin,
    Staff,
    Score,
    Site,
}

impl UserType {
    pub const ALL: [UserType; 6] = [
        UserType::Team,
        UserType::Judge,
        UserType::Admin,
        UserType::Staff,
        UserType::Score,
        UserType::Site,
    ];

    /// Option value used by the user form
    pub fn form_value(&self) -> &'static str {
        match self {
            UserType::Team => "team",
            UserType::Judge => "judge",
            UserType::Admin => "admin",
            UserType::Staff => "staff",
            UserType::Score => "score",
            UserType::Site => "site",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserType::Team => "Team",
            UserType::Judge => "Judge",
            UserType::Admin => "Admin",
            UserType::Staff => "Staff",
            UserType::Score => "Score",
            UserType::Site => "Site",
        };
        f.write_str(name)
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserType::ALL
            .into_iter()
            .find(|t| t.form_value().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown user type '{}'", s))
    }
}

impl<'de> Deserialize<'de> for UserType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Yes/no switch rendered as a select on the user form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn label(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

impl FromStr for YesNo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(YesNo::Yes),
            "no" | "n" | "false" => Ok(YesNo::No),
            other => Err(format!("expected yes or no, found '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for YesNo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(b.into()),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Judgment attached to a run, indexed by the status select value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "NA")]
    NotAnswered,
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO_Compilation")]
    CompilationError,
    #[serde(rename = "NO_Runtime")]
    RuntimeError,
    #[serde(rename = "NO_Timelimit")]
    TimeLimit,
    #[serde(rename = "NO_Presentation")]
    PresentationError,
    #[serde(rename = "NO_Wrong")]
    WrongAnswer,
    #[serde(rename = "NO_Contact")]
    ContactStaff,
    #[serde(rename = "NO_Name")]
    NameMismatch,
}

impl RunStatus {
    /// Ordered by status index
    pub const TABLE: [RunStatus; 9] = [
        RunStatus::NotAnswered,
        RunStatus::Yes,
        RunStatus::CompilationError,
        RunStatus::RuntimeError,
        RunStatus::TimeLimit,
        RunStatus::PresentationError,
        RunStatus::WrongAnswer,
        RunStatus::ContactStaff,
        RunStatus::NameMismatch,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::TABLE.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::NotAnswered => "NA",
            RunStatus::Yes => "YES",
            RunStatus::CompilationError => "NO_Compilation",
            RunStatus::RuntimeError => "NO_Runtime",
            RunStatus::TimeLimit => "NO_Timelimit",
            RunStatus::PresentationError => "NO_Presentation",
            RunStatus::WrongAnswer => "NO_Wrong",
            RunStatus::ContactStaff => "NO_Contact",
            RunStatus::NameMismatch => "NO_Name",
        }
    }

    /// YES for accepted runs, NO for everything else (including NA)
    pub fn coarse_label(&self) -> &'static str {
        match self {
            RunStatus::Yes => "YES",
            _ => "NO",
        }
    }

    /// Whether a judge produced output for this run
    pub fn is_judged(&self) -> bool {
        !matches!(self, RunStatus::NotAnswered)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    scalar_text(&value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn optional_scalar<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => scalar_text(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a string or number")),
    }
}

/// Text form of a string or number value
pub fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "NA", "NO" ; "not answered")]
    #[test_case(1, "YES", "YES" ; "accepted")]
    #[test_case(2, "NO_Compilation", "NO" ; "compilation")]
    #[test_case(6, "NO_Wrong", "NO" ; "wrong answer")]
    #[test_case(8, "NO_Name", "NO" ; "name mismatch")]
    fn test_status_table(index: usize, label: &str, coarse: &str) {
        let status = RunStatus::from_index(index).unwrap();
        assert_eq!(status.label(), label);
        assert_eq!(status.coarse_label(), coarse);
        assert_eq!(status.index(), index);
    }

    #[test]
    fn test_status_out_of_range() {
        assert!(RunStatus::from_index(9).is_none());
    }

    #[test]
    fn test_user_type_is_case_insensitive() {
        assert_eq!("team".parse::<UserType>().unwrap(), UserType::Team);
        assert_eq!("Judge".parse::<UserType>().unwrap(), UserType::Judge);
        assert!("coach".parse::<UserType>().is_err());
    }

    #[test]
    fn test_yes_no_accepts_strings_and_bools() {
        let parsed: Vec<YesNo> = serde_json::from_str(r#"["yes", "No", true, false]"#).unwrap();
        assert_eq!(parsed, vec![YesNo::Yes, YesNo::No, YesNo::Yes, YesNo::No]);
    }

    #[test]
    fn test_site_scalars_accept_numbers() {
        let site: SiteDescriptor = serde_json::from_value(serde_json::json!({
            "name": "Main",
            "startDate": "2024-03-01 10:00",
            "endDate": "2024-03-01 15:00",
            "runs": 1000,
            "tasks": "1-500",
            "chiefUsername": "chief",
            "active": true,
            "autoEnd": false,
            "scoreLevel": 3
        }))
        .unwrap();
        assert_eq!(site.runs, "1000");
        assert_eq!(site.tasks, "1-500");
        assert_eq!(site.score_level.as_deref(), Some("3"));
        assert!(site.id.is_none());
    }

    #[test]
    fn test_credential_debug_redacts_password() {
        let cred = LoginCredential {
            username: "system".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{:?}", cred);
        assert!(printed.contains("system"));
        assert!(!printed.contains("hunter2"));
    }
}
