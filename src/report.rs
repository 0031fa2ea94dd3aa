//! Human-readable sweep report.

use crate::rename_object::RenameObjectOutcome;
use crate::surface::{Mode, RuleChange, SurfaceKind};
use crate::sweep::{NamedFunctionSweep, SheetSweep, SurfaceCounts, SweepOutcome};
use std::fmt;

/// The result of one preview or apply.
#[derive(Debug)]
pub struct Report {
    pub old_name: String,
    pub new_name: String,
    pub sweep: SweepOutcome,
    /// Set only when an apply was asked to rename the range object.
    pub object_rename: Option<RenameObjectOutcome>,
}

impl Report {
    pub fn new(
        old_name: impl Into<String>,
        new_name: impl Into<String>,
        sweep: SweepOutcome,
    ) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
            sweep,
            object_rename: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.sweep.mode
    }

    pub fn totals(&self) -> SurfaceCounts {
        self.sweep.totals()
    }

    /// True when any surface, sheet enumeration, named-function call or the
    /// object rename failed.
    pub fn has_failures(&self) -> bool {
        self.sweep.issue_count() > 0
            || self
                .object_rename
                .as_ref()
                .is_some_and(RenameObjectOutcome::is_failure)
    }

    pub fn changes(&self) -> Vec<(Option<&str>, SurfaceKind, &RuleChange)> {
        self.sweep.changes()
    }
}

fn sheet_line(sheet: &SheetSweep) -> String {
    format!(
        "{}: cells {}, dataVal {}, condFmt {}, filters {}, slicers {}",
        sheet.sheet,
        sheet.count(SurfaceKind::CellFormula),
        sheet.count(SurfaceKind::DataValidation),
        sheet.count(SurfaceKind::ConditionalFormat),
        sheet.count(SurfaceKind::Filter) + sheet.count(SurfaceKind::FilterView),
        sheet.count(SurfaceKind::Slicer),
    )
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode() {
            Mode::Preview => writeln!(f, "PREVIEW (no changes applied)")?,
            Mode::Apply => writeln!(f, "APPLY (changes applied)")?,
        }
        writeln!(f, "Old name: {}", self.old_name)?;
        writeln!(f, "New name: {}", self.new_name)?;
        writeln!(f)?;

        writeln!(f, "Per-sheet updates:")?;
        for sheet in &self.sweep.sheets {
            writeln!(f, "{}", sheet_line(sheet))?;
            for (kind, issue) in sheet.issues() {
                writeln!(f, "  ! {kind}: {issue}")?;
            }
        }
        if let Some(err) = &self.sweep.document_error {
            writeln!(f, "Sheets: Skipped (error: {err})")?;
        }
        if let NamedFunctionSweep::Skipped(err) = &self.sweep.named_functions {
            writeln!(f, "Named Functions: Skipped (error: {err})")?;
        }
        writeln!(f)?;

        let totals = self.totals();
        writeln!(f, "Totals:")?;
        writeln!(f, "• Cell formulas changed: {}", totals.get(SurfaceKind::CellFormula))?;
        writeln!(
            f,
            "• Data validation (custom formulas) changed: {}",
            totals.get(SurfaceKind::DataValidation)
        )?;
        writeln!(
            f,
            "• Conditional formatting (custom formulas) changed: {}",
            totals.get(SurfaceKind::ConditionalFormat)
        )?;
        writeln!(
            f,
            "• Filters & filter views (custom formulas) changed: {}",
            totals.get(SurfaceKind::Filter) + totals.get(SurfaceKind::FilterView)
        )?;
        writeln!(
            f,
            "• Slicers (custom formulas) changed: {}",
            totals.get(SurfaceKind::Slicer)
        )?;
        write!(
            f,
            "• Named Functions updated: {}",
            totals.get(SurfaceKind::NamedFunction)
        )?;

        let failures = self.sweep.issue_count();
        if self.mode().is_apply() && failures > 0 {
            writeln!(f)?;
            writeln!(f)?;
            write!(
                f,
                "Partially applied: {failures} failure(s) above were not written; \
                 every other counted change was committed."
            )?;
        }

        if let Some(outcome) = &self.object_rename {
            writeln!(f)?;
            writeln!(f)?;
            write!(f, "{outcome}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::ServiceError;
    use crate::surface::{RuleLocation, ScanOutcome, SurfaceError};
    use crate::workbook::HostError;

    fn outcome(kind: SurfaceKind, changed: usize) -> ScanOutcome {
        let mut scan = ScanOutcome::new(kind);
        for row in 0..changed {
            scan.changes.push(RuleChange {
                location: RuleLocation::Cell { row, col: 0 },
                before: "=Rate".to_string(),
                after: "=Cost".to_string(),
            });
        }
        scan
    }

    fn sweep(mode: Mode, named_functions: NamedFunctionSweep) -> SweepOutcome {
        SweepOutcome {
            mode,
            sheets: vec![
                SheetSweep {
                    sheet: "Calc".to_string(),
                    outcomes: vec![
                        outcome(SurfaceKind::CellFormula, 2),
                        outcome(SurfaceKind::DataValidation, 1),
                        outcome(SurfaceKind::ConditionalFormat, 0),
                        outcome(SurfaceKind::Filter, 1),
                        outcome(SurfaceKind::FilterView, 1),
                        outcome(SurfaceKind::Slicer, 0),
                    ],
                },
                SheetSweep {
                    sheet: "Empty".to_string(),
                    outcomes: Vec::new(),
                },
            ],
            named_functions,
            document_error: None,
        }
    }

    #[test]
    fn test_preview_report_layout() {
        let sweep = sweep(Mode::Preview, NamedFunctionSweep::NotRequested);
        let report = Report::new("Rate", "Cost", sweep);
        let expected = "\
PREVIEW (no changes applied)
Old name: Rate
New name: Cost

Per-sheet updates:
Calc: cells 2, dataVal 1, condFmt 0, filters 2, slicers 0
Empty: cells 0, dataVal 0, condFmt 0, filters 0, slicers 0

Totals:
• Cell formulas changed: 2
• Data validation (custom formulas) changed: 1
• Conditional formatting (custom formulas) changed: 0
• Filters & filter views (custom formulas) changed: 2
• Slicers (custom formulas) changed: 0
• Named Functions updated: 0";
        assert_eq!(report.to_string(), expected);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_named_function_skip_is_reported_once() {
        let report = Report::new(
            "Rate",
            "Cost",
            sweep(
                Mode::Apply,
                NamedFunctionSweep::Skipped(ServiceError::Unauthorized { status: 403 }),
            ),
        );
        let text = report.to_string();
        assert_eq!(text.matches("Named Functions: Skipped").count(), 1);
        assert!(text.contains("• Cell formulas changed: 2"));
        assert!(text.contains("Partially applied: 1 failure(s)"));
        assert!(report.has_failures());
    }

    #[test]
    fn test_issue_lines_sit_under_their_sheet() {
        let mut swept = sweep(Mode::Preview, NamedFunctionSweep::NotRequested);
        swept.sheets[0].outcomes[1]
            .issues
            .push(SurfaceError::Read(HostError::Unavailable("offline".to_string())));

        let report = Report::new("Rate", "Cost", swept);
        let text = report.to_string();
        let calc = text.find("Calc:").unwrap();
        let issue = text.find("  ! data validation: failed to read rules").unwrap();
        let empty = text.find("Empty:").unwrap();
        assert!(calc < issue && issue < empty);
        assert!(!text.contains("Partially applied"));
    }

    #[test]
    fn test_object_rename_is_appended() {
        let sweep = sweep(Mode::Apply, NamedFunctionSweep::NotRequested);
        let mut report = Report::new("Rate", "Cost", sweep);
        report.object_rename = Some(RenameObjectOutcome::SkippedConflict {
            new: "Cost".to_string(),
        });
        assert!(report
            .to_string()
            .ends_with("\n\nSkipped renaming Named Range object: \"Cost\" already exists."));
        assert!(!report.has_failures());
    }
}
