use crate::functions::{DEFAULT_ENDPOINT, DEFAULT_TOKEN_ENV};
use serde::Deserialize;
use std::fmt;

/// A TOML rename plan: one or more renames plus the options they share.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RenamePlan {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub options: PlanOptions,
    #[serde(default)]
    pub sheets_api: Option<SheetsApi>,
    #[serde(default)]
    pub renames: Vec<RenameDefinition>,
}

impl RenamePlan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.renames.is_empty() {
            issues.push(ValidationIssue::EmptyRenameList);
        }

        for (idx, rename) in self.renames.iter().enumerate() {
            let old = rename.old.trim();
            let new = rename.new.trim();
            if old.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rename: idx + 1,
                    field: "old",
                });
            }
            if new.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rename: idx + 1,
                    field: "new",
                });
            }
            if !old.is_empty() && old == new {
                issues.push(ValidationIssue::InvalidCombo {
                    rename: Some(idx + 1),
                    message: format!("old and new are both '{old}'"),
                });
            }
        }

        if let Some(api) = &self.sheets_api {
            if api.spreadsheet_id.trim().is_empty() {
                issues.push(ValidationIssue::InvalidCombo {
                    rename: None,
                    message: "sheets_api.spreadsheet_id must not be empty".to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct PlanOptions {
    /// Also rewrite named-function bodies.
    #[serde(default)]
    pub named_functions: bool,
    /// Rename the range object after apply.
    #[serde(default)]
    pub rename_object: bool,
}

/// Remote named-function backend.
#[derive(Debug, Deserialize, Clone)]
pub struct SheetsApi {
    pub spreadsheet_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RenameDefinition {
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub new: String,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// `rename` is the 1-based position in `[[renames]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRenameList,
    MissingField {
        rename: usize,
        field: &'static str,
    },
    InvalidCombo {
        rename: Option<usize>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRenameList => write!(f, "rename plan contains no renames"),
            ValidationIssue::MissingField { rename, field } => {
                write!(f, "rename #{rename} missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { rename, message } => match rename {
                Some(n) => write!(f, "rename #{n} has invalid configuration: {message}"),
                None => write!(f, "invalid rename plan: {message}"),
            },
        }
    }
}
