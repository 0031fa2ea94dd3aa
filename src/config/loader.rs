//! Loading rename plans from TOML.

use crate::config::schema::{RenamePlan, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read rename plan from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse rename plan{}{}: {source}", origin(.path), entry(.rename))]
    Toml {
        path: Option<PathBuf>,
        /// 1-based `[[renames]]` entry the error points into.
        rename: Option<usize>,
        source: toml_edit::de::Error,
    },

    #[error("invalid rename plan{}{}: {source}", titled(.plan), origin(.path))]
    Validation {
        path: Option<PathBuf>,
        /// `meta.name` of the plan, when it has one.
        plan: Option<String>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn at_path(mut self, file: &Path) -> Self {
        match &mut self {
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.get_or_insert_with(|| file.to_path_buf());
            }
            ConfigError::Io { .. } => {}
        }
        self
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" ({})", path.display()))
        .unwrap_or_default()
}

fn entry(rename: &Option<usize>) -> String {
    rename.map(|n| format!(" in rename #{n}")).unwrap_or_default()
}

fn titled(plan: &Option<String>) -> String {
    plan.as_deref()
        .map(|name| format!(" '{name}'"))
        .unwrap_or_default()
}

/// 1-based index of the `[[renames]]` entry whose body contains `offset`.
fn rename_at(input: &str, offset: usize) -> Option<usize> {
    let mut seen = 0;
    let mut current = None;
    let mut start = 0;
    for line in input.split_inclusive('\n') {
        if start > offset {
            break;
        }
        start += line.len();

        let header = line.trim();
        if !header.starts_with('[') {
            continue;
        }
        let table = header
            .strip_prefix("[[")
            .and_then(|rest| rest.split_once("]]"))
            .map(|(name, _)| name.trim());
        if table == Some("renames") {
            seen += 1;
            current = Some(seen);
        } else {
            current = None;
        }
    }
    current
}

pub fn load_from_str(input: &str) -> Result<RenamePlan, ConfigError> {
    let plan: RenamePlan = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: None,
        rename: source.span().and_then(|span| rename_at(input, span.start)),
        source,
    })?;
    plan.validate().map_err(|source| ConfigError::Validation {
        path: None,
        plan: Some(plan.meta.name.clone()).filter(|name| !name.is_empty()),
        source,
    })?;
    Ok(plan)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RenamePlan, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ValidationIssue;

    #[test]
    fn test_minimal_plan() {
        let plan = load_from_str(
            r#"
[[renames]]
old = "Rate"
new = "Cost"
"#,
        )
        .unwrap();
        assert_eq!(plan.renames.len(), 1);
        assert!(!plan.options.named_functions);
        assert!(plan.sheets_api.is_none());
    }

    #[test]
    fn test_sheets_api_defaults() {
        let plan = load_from_str(
            r#"
[sheets_api]
spreadsheet_id = "abc"

[[renames]]
old = "Rate"
new = "Cost"
"#,
        )
        .unwrap();
        let api = plan.sheets_api.unwrap();
        assert_eq!(api.endpoint, crate::functions::DEFAULT_ENDPOINT);
        assert_eq!(api.token_env, crate::functions::DEFAULT_TOKEN_ENV);
    }

    #[test]
    fn test_collects_every_issue() {
        let err = load_from_str(
            r#"
[sheets_api]
spreadsheet_id = " "

[[renames]]
old = "Rate"
new = " Rate "

[[renames]]
old = ""
new = "Cost"
"#,
        )
        .unwrap_err();
        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(source.issues.len(), 3);
        assert!(source.issues.contains(&ValidationIssue::MissingField {
            rename: 2,
            field: "old"
        }));
    }

    #[test]
    fn test_empty_plan_rejected() {
        let err = load_from_str("[meta]\nname = \"nothing\"\n").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("invalid rename plan 'nothing':"));
        assert!(message.contains("rename plan contains no renames"));
    }

    #[test]
    fn test_type_error_names_the_rename() {
        let err = load_from_str(
            r#"
[[renames]]
old = "Rate"
new = "Cost"

[[renames]]
old = 5
new = "Price"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml { rename: Some(2), .. }));
        assert!(err.to_string().contains("in rename #2"));
    }

    #[test]
    fn test_rename_at_tracks_tables() {
        let input = "[meta]\nname = \"x\"\n\
                     [[renames]]\nold = 1\n\
                     [[ renames ]]\nold = 2\n\
                     [options]\nx = 1\n";
        assert_eq!(rename_at(input, input.find("name").unwrap()), None);
        assert_eq!(rename_at(input, input.find("old = 1").unwrap()), Some(1));
        assert_eq!(rename_at(input, input.find("old = 2").unwrap()), Some(2));
        assert_eq!(rename_at(input, input.find("x = 1").unwrap()), None);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
