//! Integration tests for rename plans: loading, validation and running a
//! plan against a workbook snapshot.

use named_range_renamer::config::{load_from_path, load_from_str, ConfigError, ValidationIssue};
use named_range_renamer::workbook::{Cell, MemorySheet, Workbook};
use named_range_renamer::{Renamer, SurfaceKind};
use std::fs;
use tempfile::TempDir;

const PLAN: &str = r#"
[meta]
name = "finance-cleanup"
description = "Rename legacy rate names"

[options]
named_functions = true
rename_object = true

[sheets_api]
spreadsheet_id = "1AbC"
token_env = "FINANCE_TOKEN"

[[renames]]
old = "Rate"
new = "Cost"

[[renames]]
old = "TaxRate"
new = "VatRate"
"#;

#[test]
fn test_full_plan_parses() {
    let plan = load_from_str(PLAN).unwrap();
    assert_eq!(plan.meta.name, "finance-cleanup");
    assert_eq!(plan.meta.description.as_deref(), Some("Rename legacy rate names"));
    assert!(plan.options.named_functions);
    assert!(plan.options.rename_object);

    let api = plan.sheets_api.unwrap();
    assert_eq!(api.spreadsheet_id, "1AbC");
    assert_eq!(api.token_env, "FINANCE_TOKEN");
    assert_eq!(api.endpoint, "https://sheets.googleapis.com/v4");

    let pairs: Vec<_> = plan
        .renames
        .iter()
        .map(|rename| (rename.old.as_str(), rename.new.as_str()))
        .collect();
    assert_eq!(pairs, vec![("Rate", "Cost"), ("TaxRate", "VatRate")]);
}

#[test]
fn test_plan_from_file_reports_path_on_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[[renames]]\nold = \"Rate\"\nnew = \"Rate\"\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    match &err {
        ConfigError::Validation {
            path: Some(p),
            source,
            ..
        } => {
            assert_eq!(p, &path);
            assert!(matches!(
                source.issues[0],
                ValidationIssue::InvalidCombo { rename: Some(1), .. }
            ));
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let err = load_from_str("[[renames]\nold = ").unwrap_err();
    assert!(matches!(err, ConfigError::Toml { path: None, .. }));
}

#[test]
fn test_plan_renames_run_in_order() {
    let plan = load_from_str(PLAN).unwrap();

    let mut workbook = Workbook::default();
    let mut sheet = MemorySheet::new("Calc");
    sheet.set_cell(0, 0, Cell::formula("=Rate+TaxRate"));
    workbook.document.sheets.push(sheet);

    let mut changed = 0;
    for rename in &plan.renames {
        let report = Renamer::new(&mut workbook.document)
            .apply(&rename.old, &rename.new, false)
            .unwrap();
        changed += report.totals().get(SurfaceKind::CellFormula);
    }

    assert_eq!(changed, 2);
    let calc = workbook.document.sheet("Calc").unwrap();
    assert_eq!(calc.cell(0, 0).unwrap().formula.as_deref(), Some("=Cost+VatRate"));
}
