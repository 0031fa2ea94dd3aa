//! Custom-formula criteria of the sheet's active filter.

use crate::surface::{
    rebuild_filter_criteria, Mode, RuleLocation, ScanOutcome, SheetSurface, SurfaceError,
    SurfaceKind,
};
use crate::token::Token;
use crate::workbook::Sheet;

/// Column criteria of the active filter, rewritten one column at a time.
pub struct Filters;

impl SheetSurface for Filters {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Filter
    }

    fn scan(&self, sheet: &mut dyn Sheet, token: &Token, mode: Mode) -> ScanOutcome {
        let filter = match sheet.filter() {
            Ok(Some(filter)) => filter,
            Ok(None) => return ScanOutcome::new(self.kind()),
            Err(source) => return ScanOutcome::read_failed(self.kind(), source),
        };

        let mut outcome = ScanOutcome::new(self.kind());
        for column in filter.range.columns() {
            let Some(criteria) = filter.column_criteria(column) else {
                continue;
            };

            let location = RuleLocation::FilterColumn { column };
            let (rebuilt, change) = match rebuild_filter_criteria(criteria, token, &location) {
                Ok(Some(rewrite)) => rewrite,
                Ok(None) => continue,
                Err(issue) => {
                    outcome.issues.push(issue);
                    continue;
                }
            };

            if mode.is_apply() {
                if let Err(source) = sheet.set_filter_column_criteria(column, rebuilt) {
                    outcome.issues.push(SurfaceError::Write { location, source });
                    continue;
                }
            }
            outcome.changes.push(change);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{Filter, FilterCriteria, GridRange, MemorySheet};
    use std::collections::BTreeMap;

    fn sheet() -> MemorySheet {
        let mut hidden = FilterCriteria::custom_formula("=B2>Rate");
        hidden.hidden_values = vec!["n/a".to_string()];
        hidden.visible_background_color = Some("#ffff00".to_string());

        let mut criteria = BTreeMap::new();
        criteria.insert(2, hidden);
        criteria.insert(3, FilterCriteria::custom_formula("=C2=TaxRate"));
        criteria.insert(
            4,
            FilterCriteria {
                hidden_values: vec!["Rate".to_string()],
                ..FilterCriteria::default()
            },
        );

        let mut sheet = MemorySheet::new("Ledger");
        sheet.filter = Some(Filter {
            range: GridRange::new(1, 1, 100, 4),
            criteria,
        });
        sheet
    }

    #[test]
    fn test_no_filter_is_zero() {
        let mut sheet = MemorySheet::new("Empty");
        let token = Token::new("Rate", "Cost").unwrap();
        let outcome = Filters.scan(&mut sheet, &token, Mode::Apply);
        assert_eq!(outcome.changed(), 0);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_apply_sets_only_matching_column() {
        let mut sheet = sheet();
        let token = Token::new("Rate", "Cost").unwrap();

        let outcome = Filters.scan(&mut sheet, &token, Mode::Apply);
        assert_eq!(outcome.changed(), 1);

        let filter = sheet.filter.as_ref().unwrap();
        let column_b = filter.column_criteria(2).unwrap();
        assert_eq!(column_b.formula(), Some("=B2>Cost"));
        assert_eq!(column_b.hidden_values, vec!["n/a".to_string()]);
        assert_eq!(column_b.visible_background_color.as_deref(), Some("#ffff00"));
        assert_eq!(filter.column_criteria(3).unwrap().formula(), Some("=C2=TaxRate"));
        assert_eq!(filter.column_criteria(4).unwrap().hidden_values, vec!["Rate".to_string()]);
    }
}
