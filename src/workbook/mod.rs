//! Host document model consumed by the rename engine.
//!
//! The engine never owns a spreadsheet. It borrows one through the
//! [`Document`] and [`Sheet`] traits for the duration of a sweep, reads each
//! rule container, and writes back rebuilt rules in apply mode. Every call
//! can fail with a [`HostError`]; the engine isolates those failures per
//! rule, surface and sheet.

pub mod memory;
pub mod rules;

use thiserror::Error;

pub use memory::{FunctionStore, MemoryDocument, MemorySheet, Workbook, WorkbookError};
pub use rules::{
    Cell, Condition, ConditionalFormatRule, ConditionalFormatRuleBuilder, CriteriaType,
    CriteriaValue, DataValidation, DataValidationBuilder, Filter, FilterCriteria,
    FilterCriteriaBuilder, FilterView, GridRange, NamedRange, RuleBuildError, Slicer, TextFormat,
    ValidationGrid,
};

/// A failure reported by the host document for a single read or write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("host rejected the request: {reason}")]
    Rejected { reason: String },

    #[error("host unavailable: {0}")]
    Unavailable(String),
}

/// One tab of the document and its rule containers.
///
/// Row and column indices are 0-based within the sheet's used range.
/// Filter, filter view and slicer columns are absolute 1-based sheet columns,
/// matching the way filters address columns.
pub trait Sheet {
    fn name(&self) -> &str;

    /// Formula text of every cell in the used range; `""` for plain values.
    fn formulas(&self) -> Result<Vec<Vec<String>>, HostError>;

    /// Replace the formula of one cell, leaving every other property alone.
    fn set_formula(&mut self, row: usize, col: usize, formula: &str) -> Result<(), HostError>;

    /// Validation rules of the used range.
    fn data_validations(&self) -> Result<ValidationGrid, HostError>;

    /// Replace the whole validation grid; the host has no per-cell patch.
    fn set_data_validations(&mut self, grid: ValidationGrid) -> Result<(), HostError>;

    /// Conditional format rules in evaluation order.
    fn conditional_format_rules(&self) -> Result<Vec<ConditionalFormatRule>, HostError>;

    fn set_conditional_format_rules(
        &mut self,
        rules: Vec<ConditionalFormatRule>,
    ) -> Result<(), HostError>;

    /// The active filter, if the sheet has one.
    fn filter(&self) -> Result<Option<Filter>, HostError>;

    fn set_filter_column_criteria(
        &mut self,
        column: u32,
        criteria: FilterCriteria,
    ) -> Result<(), HostError>;

    fn filter_views(&self) -> Result<Vec<FilterView>, HostError>;

    fn set_filter_view_column_criteria(
        &mut self,
        view_id: &str,
        column: u32,
        criteria: FilterCriteria,
    ) -> Result<(), HostError>;

    fn slicers(&self) -> Result<Vec<Slicer>, HostError>;

    fn set_slicer_criteria(
        &mut self,
        slicer_id: &str,
        criteria: FilterCriteria,
    ) -> Result<(), HostError>;
}

/// The whole document: its sheets and its formally named ranges.
pub trait Document {
    /// Sheets in tab order.
    fn sheets_mut(&mut self) -> Result<Vec<&mut dyn Sheet>, HostError>;

    fn named_ranges(&self) -> Result<Vec<NamedRange>, HostError>;

    /// Rename a named range in place, keeping the range it binds.
    fn rename_named_range(&mut self, old_name: &str, new_name: &str) -> Result<(), HostError>;
}
