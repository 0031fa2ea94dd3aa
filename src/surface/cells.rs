//! Formulas stored directly in cells.

use crate::surface::{
    Mode, RuleChange, RuleLocation, ScanOutcome, SheetSurface, SurfaceError, SurfaceKind,
};
use crate::token::Token;
use crate::workbook::Sheet;

/// Every formula-bearing cell of the used range.
///
/// Writes back one cell at a time and touches nothing but its formula text.
pub struct CellFormulas;

impl SheetSurface for CellFormulas {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::CellFormula
    }

    fn scan(&self, sheet: &mut dyn Sheet, token: &Token, mode: Mode) -> ScanOutcome {
        let formulas = match sheet.formulas() {
            Ok(formulas) => formulas,
            Err(source) => return ScanOutcome::read_failed(self.kind(), source),
        };

        let mut outcome = ScanOutcome::new(self.kind());
        for (row, cells) in formulas.iter().enumerate() {
            for (col, formula) in cells.iter().enumerate() {
                if formula.is_empty() {
                    continue;
                }
                let Some(rewritten) = token.rewrite(formula) else {
                    continue;
                };

                let location = RuleLocation::Cell { row, col };
                if mode.is_apply() {
                    if let Err(source) = sheet.set_formula(row, col, &rewritten) {
                        outcome.issues.push(SurfaceError::Write { location, source });
                        continue;
                    }
                }
                outcome.changes.push(RuleChange {
                    location,
                    before: formula.clone(),
                    after: rewritten,
                });
            }
        }
        outcome
    }
}
