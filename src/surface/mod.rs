//! Rule surfaces that can embed a custom formula.
//!
//! Every sheet-local surface implements [`SheetSurface`]: one scan call reads
//! its rule container, rewrites eligible formulas with the shared [`Token`],
//! rebuilds changed rules, and commits them only in [`Mode::Apply`]. Preview
//! and apply walk the same rules and perform the same rebuilds, so a preview's
//! counts predict an apply exactly.
//!
//! Adapters never return `Err`. A failed read, rebuild or write is recorded in
//! [`ScanOutcome::issues`] and the scan carries on with the next rule.

pub mod cells;
pub mod conditional;
pub mod filter;
pub mod filter_view;
pub mod named_functions;
pub mod slicer;
pub mod validation;

use crate::token::Token;
use crate::workbook::{FilterCriteria, HostError, RuleBuildError, Sheet};
use std::fmt;
use thiserror::Error;

pub use cells::CellFormulas;
pub use conditional::ConditionalFormats;
pub use filter::Filters;
pub use filter_view::FilterViews;
pub use named_functions::scan_named_functions;
pub use slicer::Slicers;
pub use validation::DataValidations;

/// Whether a scan commits its rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Preview,
    Apply,
}

impl Mode {
    pub fn is_apply(self) -> bool {
        self == Mode::Apply
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Preview => write!(f, "preview"),
            Mode::Apply => write!(f, "apply"),
        }
    }
}

/// Rule categories, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceKind {
    CellFormula,
    DataValidation,
    ConditionalFormat,
    Filter,
    FilterView,
    Slicer,
    NamedFunction,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 7] = [
        SurfaceKind::CellFormula,
        SurfaceKind::DataValidation,
        SurfaceKind::ConditionalFormat,
        SurfaceKind::Filter,
        SurfaceKind::FilterView,
        SurfaceKind::Slicer,
        SurfaceKind::NamedFunction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SurfaceKind::CellFormula => "cell formulas",
            SurfaceKind::DataValidation => "data validation",
            SurfaceKind::ConditionalFormat => "conditional formatting",
            SurfaceKind::Filter => "filter",
            SurfaceKind::FilterView => "filter views",
            SurfaceKind::Slicer => "slicers",
            SurfaceKind::NamedFunction => "named functions",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a rewritten rule lives. Rows and columns are shown in A1 terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLocation {
    /// 0-based position within the used range.
    Cell { row: usize, col: usize },
    /// 0-based position within the used range.
    Validation { row: usize, col: usize },
    /// Position in the evaluation order.
    ConditionalFormat { index: usize },
    /// Absolute 1-based column.
    FilterColumn { column: u32 },
    FilterViewColumn { view_id: String, column: u32 },
    Slicer { slicer_id: String },
    NamedFunction { name: String },
}

impl fmt::Display for RuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleLocation::Cell { row, col } => write!(f, "{}", a1(*row, *col)),
            RuleLocation::Validation { row, col } => write!(f, "validation {}", a1(*row, *col)),
            RuleLocation::ConditionalFormat { index } => write!(f, "rule #{}", index + 1),
            RuleLocation::FilterColumn { column } => {
                write!(f, "filter column {}", column_letters(*column))
            }
            RuleLocation::FilterViewColumn { view_id, column } => {
                write!(f, "filter view '{view_id}' column {}", column_letters(*column))
            }
            RuleLocation::Slicer { slicer_id } => write!(f, "slicer '{slicer_id}'"),
            RuleLocation::NamedFunction { name } => write!(f, "function {name}"),
        }
    }
}

/// Column letters for a 1-based column number (`1` → `A`, `27` → `AA`).
pub fn column_letters(column: u32) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 reference for a 0-based (row, col) pair.
pub fn a1(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col as u32 + 1), row + 1)
}

/// One rule whose formula text changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleChange {
    pub location: RuleLocation,
    pub before: String,
    pub after: String,
}

/// A failure isolated to one rule or one surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("failed to read rules: {0}")]
    Read(HostError),

    #[error("failed to rebuild {location}: {source}")]
    Rebuild {
        location: RuleLocation,
        source: RuleBuildError,
    },

    #[error("failed to write {location}: {source}")]
    Write {
        location: RuleLocation,
        source: HostError,
    },

    #[error("failed to write rules back: {0}")]
    WriteAll(HostError),
}

/// Result of scanning one surface: what changed and what failed.
///
/// In apply mode `changes` holds only rewrites that were committed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ScanOutcome carries isolated failures that should be reported"]
pub struct ScanOutcome {
    pub kind: SurfaceKind,
    pub changes: Vec<RuleChange>,
    pub issues: Vec<SurfaceError>,
}

impl ScanOutcome {
    pub fn new(kind: SurfaceKind) -> Self {
        Self {
            kind,
            changes: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn read_failed(kind: SurfaceKind, source: HostError) -> Self {
        Self {
            kind,
            changes: Vec::new(),
            issues: vec![SurfaceError::Read(source)],
        }
    }

    pub fn changed(&self) -> usize {
        self.changes.len()
    }
}

/// A sheet-local rule surface.
pub trait SheetSurface {
    fn kind(&self) -> SurfaceKind;

    /// Scan `sheet`, committing rebuilt rules when `mode` is apply.
    fn scan(&self, sheet: &mut dyn Sheet, token: &Token, mode: Mode) -> ScanOutcome;
}

/// Every sheet-local surface, in sweep order.
pub fn sheet_surfaces() -> [&'static dyn SheetSurface; 6] {
    [
        &CellFormulas,
        &DataValidations,
        &ConditionalFormats,
        &Filters,
        &FilterViews,
        &Slicers,
    ]
}

/// Rewrite the formula of filter-style criteria and rebuild it.
///
/// `Ok(None)` when the criteria is not a custom formula or does not mention
/// the token.
pub(crate) fn rebuild_filter_criteria(
    criteria: &FilterCriteria,
    token: &Token,
    location: &RuleLocation,
) -> Result<Option<(FilterCriteria, RuleChange)>, SurfaceError> {
    let Some(formula) = criteria.formula() else {
        return Ok(None);
    };
    let Some(rewritten) = token.rewrite(formula) else {
        return Ok(None);
    };

    let rebuilt = criteria
        .copy()
        .when_formula_satisfied(rewritten.clone())
        .build()
        .map_err(|source| SurfaceError::Rebuild {
            location: location.clone(),
            source,
        })?;

    Ok(Some((
        rebuilt,
        RuleChange {
            location: location.clone(),
            before: formula.to_string(),
            after: rewritten,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(702), "ZZ");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn test_location_display() {
        assert_eq!(RuleLocation::Cell { row: 1, col: 2 }.to_string(), "C2");
        assert_eq!(
            RuleLocation::ConditionalFormat { index: 0 }.to_string(),
            "rule #1"
        );
        assert_eq!(
            RuleLocation::FilterViewColumn {
                view_id: "v1".to_string(),
                column: 4
            }
            .to_string(),
            "filter view 'v1' column D"
        );
    }

    #[test]
    fn test_surface_order_matches_kinds() {
        let kinds: Vec<_> = sheet_surfaces().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, SurfaceKind::ALL[..6].to_vec());
    }
}
