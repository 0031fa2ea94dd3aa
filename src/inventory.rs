//! Formula inventory: where is a name used?

use crate::token::Token;
use crate::workbook::{Document, HostError};
use std::fmt;
use tracing::warn;

/// One formula cell, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaEntry {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
    pub formula: String,
}

impl fmt::Display for FormulaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!R{}C{} → {}", self.sheet, self.row, self.col, self.formula)
    }
}

#[derive(Debug, Default)]
pub struct Inventory {
    pub entries: Vec<FormulaEntry>,
    /// Sheets whose formulas could not be read.
    pub errors: Vec<(String, HostError)>,
}

/// List every formula cell in sheet order, row-major.
///
/// With a filter token only formulas containing a boundary-safe match are
/// kept.
pub fn list_formulas(
    document: &mut (dyn Document + '_),
    filter: Option<&Token>,
) -> Result<Inventory, HostError> {
    let mut inventory = Inventory::default();

    for sheet in document.sheets_mut()? {
        let formulas = match sheet.formulas() {
            Ok(formulas) => formulas,
            Err(err) => {
                warn!(sheet = sheet.name(), error = %err, "failed to read formulas");
                inventory.errors.push((sheet.name().to_string(), err));
                continue;
            }
        };

        for (r, row) in formulas.iter().enumerate() {
            for (c, formula) in row.iter().enumerate() {
                if formula.is_empty() {
                    continue;
                }
                if filter.is_some_and(|token| !token.is_match(formula)) {
                    continue;
                }
                inventory.entries.push(FormulaEntry {
                    sheet: sheet.name().to_string(),
                    row: r + 1,
                    col: c + 1,
                    formula: formula.clone(),
                });
            }
        }
    }

    Ok(inventory)
}
