//! Custom-formula conditional format rules.

use crate::surface::{
    Mode, RuleChange, RuleLocation, ScanOutcome, SheetSurface, SurfaceError, SurfaceKind,
};
use crate::token::Token;
use crate::workbook::{CriteriaValue, Sheet};

/// The sheet's ordered conditional format rules.
///
/// Rule order is evaluation precedence: the list is written back with every
/// untouched rule at its original position.
pub struct ConditionalFormats;

impl SheetSurface for ConditionalFormats {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::ConditionalFormat
    }

    fn scan(&self, sheet: &mut dyn Sheet, token: &Token, mode: Mode) -> ScanOutcome {
        let rules = match sheet.conditional_format_rules() {
            Ok(rules) => rules,
            Err(source) => return ScanOutcome::read_failed(self.kind(), source),
        };

        let mut outcome = ScanOutcome::new(self.kind());
        let mut changes = Vec::new();
        let mut out = Vec::with_capacity(rules.len());

        for (index, rule) in rules.into_iter().enumerate() {
            let Some((criteria_type, values)) = rule
                .boolean_criteria()
                .filter(|(criteria_type, _)| criteria_type.is_custom_formula())
            else {
                out.push(rule);
                continue;
            };

            let mut replaced_any = false;
            let new_values: Vec<CriteriaValue> = values
                .iter()
                .map(|value| match value {
                    CriteriaValue::Text(text) => match token.rewrite(text) {
                        Some(rewritten) => {
                            replaced_any = true;
                            CriteriaValue::Text(rewritten)
                        }
                        None => value.clone(),
                    },
                    other => other.clone(),
                })
                .collect();

            if !replaced_any {
                out.push(rule);
                continue;
            }

            let location = RuleLocation::ConditionalFormat { index };
            let before = joined_text(values);
            let after = joined_text(&new_values);
            match rule.copy().with_criteria(criteria_type, new_values).build() {
                Ok(new_rule) => {
                    out.push(new_rule);
                    changes.push(RuleChange {
                        location,
                        before,
                        after,
                    });
                }
                Err(source) => {
                    outcome.issues.push(SurfaceError::Rebuild { location, source });
                    out.push(rule);
                }
            }
        }

        if mode.is_apply() && !changes.is_empty() {
            if let Err(source) = sheet.set_conditional_format_rules(out) {
                outcome.issues.push(SurfaceError::WriteAll(source));
                return outcome;
            }
        }

        outcome.changes = changes;
        outcome
    }
}

fn joined_text(values: &[CriteriaValue]) -> String {
    values
        .iter()
        .filter_map(CriteriaValue::as_text)
        .collect::<Vec<_>>()
        .join(" | ")
}
