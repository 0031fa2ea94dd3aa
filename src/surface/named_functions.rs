//! Bodies of document-wide named functions.

use crate::functions::{NamedFunctionService, ServiceError, UpdateNamedFunction};
use crate::surface::{Mode, RuleChange, RuleLocation, ScanOutcome, SurfaceKind};
use crate::token::Token;

/// Scan every named function once for the whole document.
///
/// In apply mode all changed bodies go out as one batched partial update.
/// Any service failure is returned as-is; the caller reports it and leaves
/// the sheet-local surfaces alone.
pub fn scan_named_functions(
    service: &mut (dyn NamedFunctionService + '_),
    token: &Token,
    mode: Mode,
) -> Result<ScanOutcome, ServiceError> {
    let functions = service.list_named_functions()?;

    let mut outcome = ScanOutcome::new(SurfaceKind::NamedFunction);
    let mut updates = Vec::new();

    for function in functions {
        let Some(rewritten) = token.rewrite(&function.function_body) else {
            continue;
        };

        let name = if function.display_name.is_empty() {
            function.name.clone()
        } else {
            function.display_name.clone()
        };
        outcome.changes.push(RuleChange {
            location: RuleLocation::NamedFunction { name },
            before: function.function_body.clone(),
            after: rewritten.clone(),
        });
        updates.push(UpdateNamedFunction::body(function, rewritten));
    }

    if mode.is_apply() && !updates.is_empty() {
        service.batch_update(updates)?;
    }

    Ok(outcome)
}
