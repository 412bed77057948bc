//! Provisioning documents
//!
//! A document is kept as an untyped value so the validator can report every
//! problem at once. Typed sections are decoded on demand, after validation,
//! and only for the parts an operation actually reads: a `clear-contest`
//! document carries a contest id but no contest body.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{ContestDescriptor, ContestRef, LoginCredential, UserDescriptor, UserRef};

/// Root of a provisioning document
///
/// Recognised keys: `system`, `admin` (credentials), `contest`, `user`,
/// `userPath`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningDocument {
    value: Value,
}

impl ProvisioningDocument {
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// Read a document file, see [`load_value`]
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_value(load_value(path)?))
    }

    /// The untyped document, as the validator sees it
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Credentials of the system account (contest lifecycle)
    pub fn system(&self) -> Result<Option<LoginCredential>> {
        self.section("/system")
    }

    /// Credentials of the contest admin account (sites, problems, users, runs)
    pub fn admin(&self) -> Result<Option<LoginCredential>> {
        self.section("/admin")
    }

    pub fn contest(&self) -> Result<Option<ContestDescriptor>> {
        self.section("/contest")
    }

    /// Only the identifying part of `contest.setup`
    pub fn contest_ref(&self) -> Result<Option<ContestRef>> {
        self.section("/contest/setup")
    }

    pub fn user(&self) -> Result<Option<UserDescriptor>> {
        self.section("/user")
    }

    /// Only the identifying part of `user`
    pub fn user_ref(&self) -> Result<Option<UserRef>> {
        self.section("/user")
    }

    /// User list handed to the bulk importer
    pub fn user_path(&self) -> Option<PathBuf> {
        self.value
            .get("userPath")
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    /// Decode the value at a JSON pointer; absent or null gives `None`
    pub fn section<T: DeserializeOwned>(&self, pointer: &str) -> Result<Option<T>> {
        match self.value.pointer(pointer) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
        }
    }
}

/// Read a document as an untyped value. `.json` files are parsed as JSON,
/// anything else as YAML.
pub fn load_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        parse_yaml(&content)
    }
}

/// Parse YAML text into an untyped value
pub fn parse_yaml(content: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(content)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_and_json_load_to_same_value() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("doc.yaml");
        std::fs::write(&yaml_path, "admin:\n  username: admin\n  password: boca\nuserPath: users.txt\n").unwrap();

        let json_path = dir.path().join("doc.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(
            file,
            r#"{{"admin": {{"username": "admin", "password": "boca"}}, "userPath": "users.txt"}}"#
        )
        .unwrap();

        let yaml = ProvisioningDocument::load(&yaml_path).unwrap();
        let json = ProvisioningDocument::load(&json_path).unwrap();
        assert_eq!(yaml, json);
        assert_eq!(yaml.user_path(), Some(PathBuf::from("users.txt")));
    }

    #[test]
    fn test_typed_sections() {
        let value = parse_yaml(
            r#"
system: { username: system, password: boca }
contest:
  setup:
    name: Regional
    startDate: "2024-03-01 10:00"
    endDate: "2024-03-01 15:00"
    mainSiteNumber: 1
    active: true
  languages:
    - { id: 1, name: C, extension: c }
"#,
        )
        .unwrap();

        let doc = ProvisioningDocument::from_value(value);
        let contest = doc.contest().unwrap().unwrap();
        assert_eq!(contest.setup.local_site_number(), 1);
        assert!(contest.has_contest_entities());
        assert_eq!(doc.system().unwrap().unwrap().username, "system");
        assert!(doc.admin().unwrap().is_none());
        assert!(doc.user().unwrap().is_none());
    }

    #[test]
    fn test_identifier_sections_ignore_missing_body() {
        let value = parse_yaml(
            r#"
contest: { setup: { id: 3 } }
user: { userNumber: 42 }
"#,
        )
        .unwrap();

        let doc = ProvisioningDocument::from_value(value);
        assert_eq!(doc.contest_ref().unwrap().unwrap().id, Some(3));
        assert!(doc.contest().is_err());

        let user = doc.user_ref().unwrap().unwrap();
        assert_eq!(user.user_number, Some(42));
        assert_eq!(user.user_site_number, None);
        assert!(doc.user().is_err());
    }
}
