//! Custom-formula criteria attached to slicers.

use crate::surface::{
    rebuild_filter_criteria, Mode, RuleLocation, ScanOutcome, SheetSurface, SurfaceError,
    SurfaceKind,
};
use crate::token::Token;
use crate::workbook::Sheet;

/// The single column-filter criterion of each slicer, written back per slicer.
pub struct Slicers;

impl SheetSurface for Slicers {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Slicer
    }

    fn scan(&self, sheet: &mut dyn Sheet, token: &Token, mode: Mode) -> ScanOutcome {
        let slicers = match sheet.slicers() {
            Ok(slicers) => slicers,
            Err(source) => return ScanOutcome::read_failed(self.kind(), source),
        };

        let mut outcome = ScanOutcome::new(self.kind());
        for slicer in &slicers {
            let Some(criteria) = &slicer.criteria else {
                continue;
            };

            let location = RuleLocation::Slicer {
                slicer_id: slicer.id.clone(),
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
                if let Err(source) = sheet.set_slicer_criteria(&slicer.id, rebuilt) {
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
    use crate::workbook::{FilterCriteria, MemorySheet, Slicer};

    #[test]
    fn test_slicers_without_criteria_are_skipped() {
        let mut sheet = MemorySheet::new("Dash");
        sheet.slicers = vec![
            Slicer {
                id: "s1".to_string(),
                title: Some("Region".to_string()),
                column_position: Some(2),
                criteria: None,
            },
            Slicer {
                id: "s2".to_string(),
                title: None,
                column_position: Some(3),
                criteria: Some(FilterCriteria::custom_formula("=C2>=Rate")),
            },
        ];
        let token = Token::new("Rate", "Cost").unwrap();

        let outcome = Slicers.scan(&mut sheet, &token, Mode::Apply);
        assert_eq!(outcome.changed(), 1);
        assert!(sheet.slicers[0].criteria.is_none());
        assert_eq!(
            sheet.slicers[1].criteria.as_ref().unwrap().formula(),
            Some("=C2>=Cost")
        );
        assert_eq!(sheet.slicers[1].column_position, Some(3));
    }
}
