//! Custom-formula data validation rules.

use crate::surface::{
    Mode, RuleChange, RuleLocation, ScanOutcome, SheetSurface, SurfaceError, SurfaceKind,
};
use crate::token::Token;
use crate::workbook::Sheet;

/// Validation rules of the used range.
///
/// The host only supports replacing the whole grid, so rebuilt rules are
/// spliced into a copy of the grid and written back once.
pub struct DataValidations;

impl SheetSurface for DataValidations {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::DataValidation
    }

    fn scan(&self, sheet: &mut dyn Sheet, token: &Token, mode: Mode) -> ScanOutcome {
        let grid = match sheet.data_validations() {
            Ok(grid) => grid,
            Err(source) => return ScanOutcome::read_failed(self.kind(), source),
        };

        let mut outcome = ScanOutcome::new(self.kind());
        let mut rebuilt = grid.clone();
        let mut changes = Vec::new();

        for (row, rules) in grid.iter().enumerate() {
            for (col, rule) in rules.iter().enumerate() {
                let Some(rule) = rule else {
                    continue;
                };
                let Some(formula) = rule.formula() else {
                    continue;
                };
                let Some(rewritten) = token.rewrite(formula) else {
                    continue;
                };

                let location = RuleLocation::Validation { row, col };
                match rule.copy().require_formula_satisfied(rewritten.clone()).build() {
                    Ok(new_rule) => {
                        rebuilt[row][col] = Some(new_rule);
                        changes.push(RuleChange {
                            location,
                            before: formula.to_string(),
                            after: rewritten,
                        });
                    }
                    Err(source) => outcome.issues.push(SurfaceError::Rebuild { location, source }),
                }
            }
        }

        if mode.is_apply() && !changes.is_empty() {
            if let Err(source) = sheet.set_data_validations(rebuilt) {
                outcome.issues.push(SurfaceError::WriteAll(source));
                return outcome;
            }
        }

        outcome.changes = changes;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{Cell, CriteriaType, CriteriaValue, DataValidation, MemorySheet};

    fn sheet() -> MemorySheet {
        let mut sheet = MemorySheet::new("Input");
        sheet.set_cell(2, 2, Cell::value(0));

        let mut custom = DataValidation::custom_formula("=A1<=Rate");
        custom.help_text = Some("must not exceed the rate".to_string());
        custom.allow_invalid = true;
        sheet.set_validation(0, 0, custom);

        sheet.set_validation(
            1,
            1,
            DataValidation {
                criteria_type: CriteriaType::TextContains,
                criteria_values: vec![CriteriaValue::Text("Rate".to_string())],
                help_text: None,
                allow_invalid: false,
            },
        );
        sheet.set_validation(2, 2, DataValidation::custom_formula("=ISNUMBER(TaxRate)"));
        sheet
    }

    #[test]
    fn test_only_custom_formulas_are_eligible() {
        let mut sheet = sheet();
        let token = Token::new("Rate", "Cost").unwrap();

        let outcome = DataValidations.scan(&mut sheet, &token, Mode::Preview);
        assert_eq!(outcome.changed(), 1);
        assert_eq!(sheet.validation(0, 0).unwrap().formula(), Some("=A1<=Rate"));
    }

    #[test]
    fn test_apply_preserves_help_text_and_strictness() {
        let mut sheet = sheet();
        let token = Token::new("Rate", "Cost").unwrap();

        let outcome = DataValidations.scan(&mut sheet, &token, Mode::Apply);
        assert_eq!(outcome.changed(), 1);

        let rule = sheet.validation(0, 0).unwrap();
        assert_eq!(rule.formula(), Some("=A1<=Cost"));
        assert_eq!(rule.help_text.as_deref(), Some("must not exceed the rate"));
        assert!(rule.allow_invalid);

        let untouched = sheet.validation(1, 1).unwrap();
        assert_eq!(untouched.criteria_type, CriteriaType::TextContains);
        assert_eq!(sheet.validation(2, 2).unwrap().formula(), Some("=ISNUMBER(TaxRate)"));
    }
}
