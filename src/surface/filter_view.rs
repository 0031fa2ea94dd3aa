//! Custom-formula criteria of saved filter views.

use crate::surface::{
    rebuild_filter_criteria, Mode, RuleLocation, ScanOutcome, SheetSurface, SurfaceError,
    SurfaceKind,
};
use crate::token::Token;
use crate::workbook::Sheet;

/// Every column of every saved filter view on the sheet.
pub struct FilterViews;

impl SheetSurface for FilterViews {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::FilterView
    }

    fn scan(&self, sheet: &mut dyn Sheet, token: &Token, mode: Mode) -> ScanOutcome {
        let views = match sheet.filter_views() {
            Ok(views) => views,
            Err(source) => return ScanOutcome::read_failed(self.kind(), source),
        };

        let mut outcome = ScanOutcome::new(self.kind());
        for view in &views {
            for column in view.range.columns() {
                let Some(criteria) = view.column_criteria(column) else {
                    continue;
                };

                let location = RuleLocation::FilterViewColumn {
                    view_id: view.id.clone(),
                    column,
                };
                let (rebuilt, change) = match rebuild_filter_criteria(criteria, token, &location) {
                    Ok(Some(rewrite)) => rewrite,
                    Ok(None) => continue,
                    Err(issue) => {
                        outcome.issues.push(issue);
                        continue;
                    }
                };

                if mode.is_apply() {
                    if let Err(source) =
                        sheet.set_filter_view_column_criteria(&view.id, column, rebuilt)
                    {
                        outcome.issues.push(SurfaceError::Write { location, source });
                        continue;
                    }
                }
                outcome.changes.push(change);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{FilterCriteria, FilterView, GridRange, MemorySheet};
    use std::collections::BTreeMap;

    fn view(id: &str, start_column: u32, criteria: &[(u32, &str)]) -> FilterView {
        FilterView {
            id: id.to_string(),
            title: format!("view {id}"),
            range: GridRange::new(1, start_column, 20, 3),
            criteria: criteria
                .iter()
                .map(|(column, formula)| (*column, FilterCriteria::custom_formula(*formula)))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_scans_every_view_within_its_range() {
        let mut sheet = MemorySheet::new("Ledger");
        sheet.filter_views = vec![
            view("v1", 1, &[(1, "=A2=Rate"), (3, "=C2>Rate_old")]),
            // Column 9 is outside the view range and is never visited.
            view("v2", 5, &[(6, "=F2<>Rate"), (9, "=Rate")]),
        ];
        let token = Token::new("Rate", "Cost").unwrap();

        let preview = FilterViews.scan(&mut sheet, &token, Mode::Preview);
        assert_eq!(preview.changed(), 2);

        let applied = FilterViews.scan(&mut sheet, &token, Mode::Apply);
        assert_eq!(applied.changed(), 2);
        assert_eq!(sheet.filter_views[0].column_criteria(1).unwrap().formula(), Some("=A2=Cost"));
        assert_eq!(
            sheet.filter_views[0].column_criteria(3).unwrap().formula(),
            Some("=C2>Rate_old")
        );
        assert_eq!(sheet.filter_views[1].column_criteria(6).unwrap().formula(), Some("=F2<>Cost"));
        assert_eq!(sheet.filter_views[1].title, "view v2");
    }
}
