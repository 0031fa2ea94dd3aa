//! Sweep coordinator: every sheet × every surface, one token, one mode.
//!
//! Preview and apply run this same traversal; only the mode flag differs.
//! Surfaces share no state with each other, so totals do not depend on the
//! order in which they are visited. Apply commits each surface as it
//! finishes; there is no cancellation point once a sweep has started.

use crate::functions::{NamedFunctionService, ServiceError};
use crate::surface::{
    scan_named_functions, sheet_surfaces, Mode, RuleChange, ScanOutcome, SurfaceError,
    SurfaceKind,
};
use crate::token::Token;
use crate::workbook::{Document, HostError};
use std::collections::BTreeMap;
use tracing::{debug, info_span, warn};

/// Changed-rule counts keyed by surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceCounts(BTreeMap<SurfaceKind, usize>);

impl SurfaceCounts {
    pub fn get(&self, kind: SurfaceKind) -> usize {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn add(&mut self, kind: SurfaceKind, count: usize) {
        *self.0.entry(kind).or_insert(0) += count;
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Every surface in report order, including zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (SurfaceKind, usize)> + '_ {
        SurfaceKind::ALL.iter().map(move |kind| (*kind, self.get(*kind)))
    }
}

/// Scan outcomes for one sheet, one per sheet-local surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSweep {
    pub sheet: String,
    pub outcomes: Vec<ScanOutcome>,
}

impl SheetSweep {
    pub fn count(&self, kind: SurfaceKind) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.kind == kind)
            .map(ScanOutcome::changed)
            .sum()
    }

    pub fn issues(&self) -> impl Iterator<Item = (SurfaceKind, &SurfaceError)> + '_ {
        self.outcomes
            .iter()
            .flat_map(|outcome| outcome.issues.iter().map(move |issue| (outcome.kind, issue)))
    }
}

/// What happened to the named-function surface.
#[derive(Debug)]
pub enum NamedFunctionSweep {
    /// The caller did not ask for named functions.
    NotRequested,
    Scanned(ScanOutcome),
    /// Read, auth or transport failure; nothing was sent.
    Skipped(ServiceError),
}

#[derive(Debug)]
pub struct SweepOutcome {
    pub mode: Mode,
    pub sheets: Vec<SheetSweep>,
    pub named_functions: NamedFunctionSweep,
    /// The document could not enumerate its sheets.
    pub document_error: Option<HostError>,
}

impl SweepOutcome {
    pub fn totals(&self) -> SurfaceCounts {
        let mut totals = SurfaceCounts::default();
        for sheet in &self.sheets {
            for outcome in &sheet.outcomes {
                totals.add(outcome.kind, outcome.changed());
            }
        }
        if let NamedFunctionSweep::Scanned(outcome) = &self.named_functions {
            totals.add(outcome.kind, outcome.changed());
        }
        totals
    }

    /// Isolated failures across the whole sweep.
    pub fn issue_count(&self) -> usize {
        let sheet_issues: usize = self.sheets.iter().map(|sheet| sheet.issues().count()).sum();
        let function_issues = match &self.named_functions {
            NamedFunctionSweep::Scanned(outcome) => outcome.issues.len(),
            NamedFunctionSweep::Skipped(_) => 1,
            NamedFunctionSweep::NotRequested => 0,
        };
        sheet_issues + function_issues + usize::from(self.document_error.is_some())
    }

    /// Every change with the sheet it belongs to (`None` for document-wide).
    pub fn changes(&self) -> Vec<(Option<&str>, SurfaceKind, &RuleChange)> {
        let mut changes = Vec::new();
        for sheet in &self.sheets {
            for outcome in &sheet.outcomes {
                for change in &outcome.changes {
                    changes.push((Some(sheet.sheet.as_str()), outcome.kind, change));
                }
            }
        }
        if let NamedFunctionSweep::Scanned(outcome) = &self.named_functions {
            for change in &outcome.changes {
                changes.push((None, outcome.kind, change));
            }
        }
        changes
    }
}

/// Run one sweep.
///
/// The named-function surface runs once, after all sheets, and only when a
/// service is supplied. Its failure never touches sheet-local results.
pub fn sweep(
    document: &mut (dyn Document + '_),
    named_functions: Option<&mut (dyn NamedFunctionService + '_)>,
    token: &Token,
    mode: Mode,
) -> SweepOutcome {
    let span = info_span!(
        "sweep",
        %mode,
        old = token.old_name(),
        new = token.new_name()
    );
    let _enter = span.enter();

    let mut outcome = SweepOutcome {
        mode,
        sheets: Vec::new(),
        named_functions: NamedFunctionSweep::NotRequested,
        document_error: None,
    };

    match document.sheets_mut() {
        Ok(sheets) => {
            for sheet in sheets {
                let name = sheet.name().to_string();
                let mut outcomes = Vec::with_capacity(6);
                for surface in sheet_surfaces() {
                    let scan = surface.scan(&mut *sheet, token, mode);
                    debug!(
                        sheet = %name,
                        surface = %scan.kind,
                        changed = scan.changed(),
                        "scanned surface"
                    );
                    for issue in &scan.issues {
                        warn!(
                            sheet = %name,
                            surface = %scan.kind,
                            error = %issue,
                            "isolated surface failure"
                        );
                    }
                    outcomes.push(scan);
                }
                outcome.sheets.push(SheetSweep {
                    sheet: name,
                    outcomes,
                });
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to enumerate sheets");
            outcome.document_error = Some(err);
        }
    }

    if let Some(service) = named_functions {
        outcome.named_functions = match scan_named_functions(service, token, mode) {
            Ok(scan) => {
                debug!(changed = scan.changed(), "scanned named functions");
                NamedFunctionSweep::Scanned(scan)
            }
            Err(err) => {
                warn!(error = %err, "skipping named functions");
                NamedFunctionSweep::Skipped(err)
            }
        };
    }

    outcome
}
