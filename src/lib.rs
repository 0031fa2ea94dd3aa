//! Named Range Renamer: rename a named range everywhere its name is used
//!
//! A rename walks every formula-bearing surface of a spreadsheet and rewrites
//! standalone occurrences of the old name: cell formulas, custom-formula data
//! validation, conditional formatting, the sheet filter, filter views,
//! slicers and (optionally) named-function bodies.
//!
//! # Architecture
//!
//! Every rewrite goes through one primitive: [`Token`], a boundary-safe
//! matcher that never touches a longer identifier (`Rate` inside `TaxRate`).
//! Surfaces only decide where formulas live and how to rebuild the rule that
//! holds them; see [`surface`].
//!
//! # Safety
//!
//! - Preview and apply run the same sweep; only writes are gated
//! - Applying twice is a no-op the second time
//! - A failed rule, surface or sheet is reported and the sweep carries on
//! - The range object is never renamed onto an existing name
//!
//! # Example
//!
//! ```no_run
//! use named_range_renamer::workbook::Workbook;
//! use named_range_renamer::Renamer;
//!
//! let mut workbook = Workbook::load("budget.json").unwrap();
//! let report = Renamer::new(&mut workbook.document)
//!     .with_named_functions(&mut workbook.named_functions)
//!     .preview("Rate", "Cost")
//!     .unwrap();
//! println!("{report}");
//! ```

pub mod config;
pub mod functions;
pub mod inventory;
pub mod rename_object;
pub mod renamer;
pub mod report;
pub mod surface;
pub mod sweep;
pub mod token;
pub mod workbook;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, RenamePlan};
pub use functions::{NamedFunction, NamedFunctionService, ServiceError};
pub use rename_object::{rename_named_object, RenameObjectOutcome};
pub use renamer::Renamer;
pub use report::Report;
pub use surface::{Mode, RuleChange, RuleLocation, ScanOutcome, SurfaceError, SurfaceKind};
pub use sweep::{sweep, NamedFunctionSweep, SheetSweep, SurfaceCounts, SweepOutcome};
pub use token::{Token, TokenError};
pub use workbook::{Document, HostError, Sheet};
