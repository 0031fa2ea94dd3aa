//! Public entry point: preview or apply one rename.

use crate::functions::NamedFunctionService;
use crate::rename_object::rename_named_object;
use crate::report::Report;
use crate::surface::Mode;
use crate::sweep::{sweep, SweepOutcome};
use crate::token::{Token, TokenError};
use crate::workbook::Document;

/// Renames a named range's token across every formula-bearing surface of a
/// document.
///
/// Named functions are only touched when a service is attached with
/// [`Renamer::with_named_functions`].
pub struct Renamer<'a> {
    document: &'a mut (dyn Document + 'a),
    named_functions: Option<&'a mut (dyn NamedFunctionService + 'a)>,
}

impl<'a> Renamer<'a> {
    pub fn new(document: &'a mut (dyn Document + 'a)) -> Self {
        Self {
            document,
            named_functions: None,
        }
    }

    pub fn with_named_functions(
        mut self,
        service: &'a mut (dyn NamedFunctionService + 'a),
    ) -> Self {
        self.named_functions = Some(service);
        self
    }

    /// Report what an apply would change. Never mutates anything.
    pub fn preview(&mut self, old_name: &str, new_name: &str) -> Result<Report, TokenError> {
        let token = Token::new(old_name, new_name)?;
        let outcome = self.run(&token, Mode::Preview);
        Ok(Report::new(token.old_name(), token.new_name(), outcome))
    }

    /// Commit every rewrite the matching preview reported.
    ///
    /// With `rename_object` set, the range object itself is renamed after the
    /// sweep, unless a range already holds the new name.
    pub fn apply(
        &mut self,
        old_name: &str,
        new_name: &str,
        rename_object: bool,
    ) -> Result<Report, TokenError> {
        let token = Token::new(old_name, new_name)?;
        let outcome = self.run(&token, Mode::Apply);
        let mut report = Report::new(token.old_name(), token.new_name(), outcome);
        if rename_object {
            report.object_rename = Some(rename_named_object(
                &mut *self.document,
                token.old_name(),
                token.new_name(),
            ));
        }
        Ok(report)
    }

    fn run(&mut self, token: &Token, mode: Mode) -> SweepOutcome {
        sweep(
            &mut *self.document,
            self.named_functions.as_deref_mut(),
            token,
            mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::NamedFunction;
    use crate::workbook::{Cell, FunctionStore, MemoryDocument, MemorySheet, NamedRange};

    fn document() -> MemoryDocument {
        let mut sheet = MemorySheet::new("Calc");
        sheet.set_cell(0, 0, Cell::formula("=Rate+TaxRate*2"));
        MemoryDocument {
            sheets: vec![sheet],
            named_ranges: vec![NamedRange {
                name: "Rate".to_string(),
                range: "Calc!B1".to_string(),
            }],
        }
    }

    #[test]
    fn test_rejects_empty_names() {
        let mut doc = document();
        let mut renamer = Renamer::new(&mut doc);
        assert!(matches!(renamer.preview("  ", "Cost"), Err(TokenError::EmptyOldName)));
        assert!(matches!(renamer.apply("Rate", "", false), Err(TokenError::EmptyNewName)));
    }

    #[test]
    fn test_preview_leaves_document_untouched() {
        let mut doc = document();
        let before = doc.clone();
        let report = Renamer::new(&mut doc).preview("Rate", "Cost").unwrap();
        assert_eq!(report.totals().total(), 1);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_apply_with_object_rename() {
        let mut doc = document();
        let mut store = FunctionStore(vec![NamedFunction {
            name: "margin".to_string(),
            display_name: "MARGIN".to_string(),
            parameters: Vec::new(),
            function_body: "=x-Rate".to_string(),
        }]);

        let report = Renamer::new(&mut doc)
            .with_named_functions(&mut store)
            .apply(" Rate ", "Cost", true)
            .unwrap();
        assert_eq!(report.totals().total(), 2);
        assert_eq!(report.old_name, "Rate");

        assert_eq!(
            doc.sheets[0].cell(0, 0).and_then(|cell| cell.formula.as_deref()),
            Some("=Cost+TaxRate*2")
        );
        assert_eq!(doc.named_ranges[0].name, "Cost");
        assert_eq!(store.get("margin").unwrap().function_body, "=x-Cost");
    }
}
