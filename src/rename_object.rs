//! Renaming the named-range object itself.
//!
//! Runs only after an apply sweep and only when the caller confirmed it. An
//! existing range under the new name is never overwritten or merged.

use crate::workbook::{Document, HostError};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameObjectOutcome {
    Renamed { old: String, new: String },
    /// A range already carries the new name; nothing was touched.
    SkippedConflict { new: String },
    NotFound { old: String },
    Failed(HostError),
}

impl RenameObjectOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RenameObjectOutcome::Failed(_))
    }
}

impl fmt::Display for RenameObjectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameObjectOutcome::Renamed { old, new } => {
                write!(f, "Renamed Named Range object \"{old}\" → \"{new}\".")
            }
            RenameObjectOutcome::SkippedConflict { new } => {
                write!(f, "Skipped renaming Named Range object: \"{new}\" already exists.")
            }
            RenameObjectOutcome::NotFound { old } => {
                write!(f, "No Named Range object named \"{old}\" found.")
            }
            RenameObjectOutcome::Failed(err) => {
                write!(f, "Failed to rename Named Range object: {err}")
            }
        }
    }
}

/// Rename the range bound to `old` so it is bound to `new`.
///
/// The conflict check comes first, so the document is not mutated when the
/// target name is taken.
pub fn rename_named_object(
    document: &mut (dyn Document + '_),
    old: &str,
    new: &str,
) -> RenameObjectOutcome {
    let ranges = match document.named_ranges() {
        Ok(ranges) => ranges,
        Err(err) => {
            warn!(error = %err, "failed to list named ranges");
            return RenameObjectOutcome::Failed(err);
        }
    };

    if ranges.iter().any(|range| range.name == new) {
        info!(new, "named range already exists, leaving it alone");
        return RenameObjectOutcome::SkippedConflict {
            new: new.to_string(),
        };
    }
    if !ranges.iter().any(|range| range.name == old) {
        return RenameObjectOutcome::NotFound {
            old: old.to_string(),
        };
    }

    match document.rename_named_range(old, new) {
        Ok(()) => {
            info!(old, new, "renamed named range");
            RenameObjectOutcome::Renamed {
                old: old.to_string(),
                new: new.to_string(),
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to rename named range");
            RenameObjectOutcome::Failed(err)
        }
    }
}
