//! In-memory workbook that can be loaded from and saved to a JSON snapshot.

use crate::functions::{NamedFunction, NamedFunctionService, ServiceError, UpdateNamedFunction};
use crate::workbook::rules::{
    Cell, ConditionalFormatRule, DataValidation, Filter, FilterCriteria, FilterView, GridRange,
    NamedRange, Slicer, ValidationGrid,
};
use crate::workbook::{Document, HostError, Sheet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("failed to read workbook {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse workbook {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write workbook {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize workbook: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySheet {
    pub name: String,
    #[serde(default)]
    pub cells: Vec<Vec<Cell>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_validations: ValidationGrid,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_formats: Vec<ConditionalFormatRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_views: Vec<FilterView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slicers: Vec<Slicer>,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rows and columns of the used range, covering cells and validation rules.
    pub fn used_range(&self) -> (usize, usize) {
        let rows = self.cells.len().max(self.data_validations.len());
        let cols = self
            .cells
            .iter()
            .map(Vec::len)
            .chain(self.data_validations.iter().map(Vec::len))
            .max()
            .unwrap_or(0);
        (rows, cols)
    }

    /// Place `cell` at (row, col), growing the grid as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if self.cells.len() <= row {
            self.cells.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.cells[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, Cell::default);
        }
        cells[col] = cell;
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|cells| cells.get(col))
    }

    /// Attach a validation rule at (row, col), growing the grid as needed.
    pub fn set_validation(&mut self, row: usize, col: usize, rule: DataValidation) {
        if self.data_validations.len() <= row {
            self.data_validations.resize_with(row + 1, Vec::new);
        }
        let rules = &mut self.data_validations[row];
        if rules.len() <= col {
            rules.resize_with(col + 1, || None);
        }
        rules[col] = Some(rule);
    }

    fn clear_validation(&mut self, row: usize, col: usize) {
        if let Some(slot) = self
            .data_validations
            .get_mut(row)
            .and_then(|rules| rules.get_mut(col))
        {
            *slot = None;
        }
    }

    pub fn validation(&self, row: usize, col: usize) -> Option<&DataValidation> {
        self.data_validations
            .get(row)
            .and_then(|rules| rules.get(col))
            .and_then(Option::as_ref)
    }

    fn filter_view_mut(&mut self, view_id: &str) -> Result<&mut FilterView, HostError> {
        let sheet = self.name.clone();
        self.filter_views
            .iter_mut()
            .find(|view| view.id == view_id)
            .ok_or_else(|| HostError::NotFound {
                what: format!("filter view '{view_id}' on sheet '{sheet}'"),
            })
    }
}

impl Sheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn formulas(&self) -> Result<Vec<Vec<String>>, HostError> {
        let (rows, cols) = self.used_range();
        Ok((0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        self.cell(row, col)
                            .and_then(|cell| cell.formula.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect())
    }

    fn set_formula(&mut self, row: usize, col: usize, formula: &str) -> Result<(), HostError> {
        let (rows, cols) = self.used_range();
        if row >= rows || col >= cols {
            return Err(HostError::Rejected {
                reason: format!("cell ({row}, {col}) is outside the used range {rows}x{cols}"),
            });
        }
        if self.cell(row, col).is_none() {
            self.set_cell(row, col, Cell::default());
        }
        if let Some(cell) = self.cells.get_mut(row).and_then(|cells| cells.get_mut(col)) {
            cell.formula = Some(formula.to_string());
        }
        Ok(())
    }

    fn data_validations(&self) -> Result<ValidationGrid, HostError> {
        let (rows, cols) = self.used_range();
        Ok((0..rows)
            .map(|row| (0..cols).map(|col| self.validation(row, col).cloned()).collect())
            .collect())
    }

    fn set_data_validations(&mut self, grid: ValidationGrid) -> Result<(), HostError> {
        let (rows, cols) = self.used_range();
        if grid.len() != rows || grid.iter().any(|row| row.len() != cols) {
            return Err(HostError::Rejected {
                reason: format!("validation grid does not match the used range {rows}x{cols}"),
            });
        }
        // Splice cell by cell so the stored grid keeps its own shape.
        for (row, rules) in grid.into_iter().enumerate() {
            for (col, rule) in rules.into_iter().enumerate() {
                match rule {
                    Some(rule) => self.set_validation(row, col, rule),
                    None => self.clear_validation(row, col),
                }
            }
        }
        Ok(())
    }

    fn conditional_format_rules(&self) -> Result<Vec<ConditionalFormatRule>, HostError> {
        Ok(self.conditional_formats.clone())
    }

    fn set_conditional_format_rules(
        &mut self,
        rules: Vec<ConditionalFormatRule>,
    ) -> Result<(), HostError> {
        self.conditional_formats = rules;
        Ok(())
    }

    fn filter(&self) -> Result<Option<Filter>, HostError> {
        if let Some(filter) = &self.filter {
            check_range(&filter.range, "filter")?;
        }
        Ok(self.filter.clone())
    }

    fn set_filter_column_criteria(
        &mut self,
        column: u32,
        criteria: FilterCriteria,
    ) -> Result<(), HostError> {
        let sheet = self.name.clone();
        let filter = self.filter.as_mut().ok_or_else(|| HostError::NotFound {
            what: format!("filter on sheet '{sheet}'"),
        })?;
        if !filter.range.columns().contains(&column) {
            return Err(HostError::Rejected {
                reason: format!("column {column} is outside the filter range"),
            });
        }
        filter.criteria.insert(column, criteria);
        Ok(())
    }

    fn filter_views(&self) -> Result<Vec<FilterView>, HostError> {
        for view in &self.filter_views {
            check_range(&view.range, &format!("filter view '{}'", view.id))?;
        }
        Ok(self.filter_views.clone())
    }

    fn set_filter_view_column_criteria(
        &mut self,
        view_id: &str,
        column: u32,
        criteria: FilterCriteria,
    ) -> Result<(), HostError> {
        let view = self.filter_view_mut(view_id)?;
        if !view.range.columns().contains(&column) {
            return Err(HostError::Rejected {
                reason: format!("column {column} is outside filter view '{view_id}'"),
            });
        }
        view.criteria.insert(column, criteria);
        Ok(())
    }

    fn slicers(&self) -> Result<Vec<Slicer>, HostError> {
        Ok(self.slicers.clone())
    }

    fn set_slicer_criteria(
        &mut self,
        slicer_id: &str,
        criteria: FilterCriteria,
    ) -> Result<(), HostError> {
        let sheet = self.name.clone();
        let slicer = self
            .slicers
            .iter_mut()
            .find(|slicer| slicer.id == slicer_id)
            .ok_or_else(|| HostError::NotFound {
                what: format!("slicer '{slicer_id}' on sheet '{sheet}'"),
            })?;
        slicer.criteria = Some(criteria);
        Ok(())
    }
}

fn check_range(range: &GridRange, what: &str) -> Result<(), HostError> {
    if range.end_column().is_none() {
        return Err(HostError::Rejected {
            reason: format!(
                "{what} range starting at column {} spans past the last column",
                range.start_column
            ),
        });
    }
    Ok(())
}

/// Sheets plus the document's named ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub sheets: Vec<MemorySheet>,
    #[serde(default)]
    pub named_ranges: Vec<NamedRange>,
}

impl MemoryDocument {
    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

impl Document for MemoryDocument {
    fn sheets_mut(&mut self) -> Result<Vec<&mut dyn Sheet>, HostError> {
        Ok(self
            .sheets
            .iter_mut()
            .map(|sheet| sheet as &mut dyn Sheet)
            .collect())
    }

    fn named_ranges(&self) -> Result<Vec<NamedRange>, HostError> {
        Ok(self.named_ranges.clone())
    }

    fn rename_named_range(&mut self, old_name: &str, new_name: &str) -> Result<(), HostError> {
        if self.named_ranges.iter().any(|range| range.name == new_name) {
            return Err(HostError::Rejected {
                reason: format!("named range '{new_name}' already exists"),
            });
        }
        let range = self
            .named_ranges
            .iter_mut()
            .find(|range| range.name == old_name)
            .ok_or_else(|| HostError::NotFound {
                what: format!("named range '{old_name}'"),
            })?;
        range.name = new_name.to_string();
        Ok(())
    }
}

/// Named functions kept alongside the workbook snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionStore(pub Vec<NamedFunction>);

impl FunctionStore {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NamedFunction> {
        self.0.iter().find(|function| function.name == name)
    }
}

impl NamedFunctionService for FunctionStore {
    fn list_named_functions(&mut self) -> Result<Vec<NamedFunction>, ServiceError> {
        Ok(self.0.clone())
    }

    fn batch_update(&mut self, updates: Vec<UpdateNamedFunction>) -> Result<(), ServiceError> {
        // Validate the whole batch before touching anything, like a remote batch call.
        for update in &updates {
            if update.fields != crate::functions::FUNCTION_BODY_FIELD {
                return Err(ServiceError::Rejected {
                    reason: format!("unsupported field mask '{}'", update.fields),
                });
            }
            if self.get(&update.named_function.name).is_none() {
                return Err(ServiceError::Rejected {
                    reason: format!("named function '{}' not found", update.named_function.name),
                });
            }
        }
        for update in updates {
            if let Some(function) = self
                .0
                .iter_mut()
                .find(|function| function.name == update.named_function.name)
            {
                function.function_body = update.named_function.function_body;
            }
        }
        Ok(())
    }
}

/// A workbook snapshot: the document plus its locally stored named functions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(flatten)]
    pub document: MemoryDocument,
    #[serde(default, skip_serializing_if = "FunctionStore::is_empty")]
    pub named_functions: FunctionStore,
}

impl Workbook {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkbookError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| WorkbookError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| WorkbookError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the snapshot atomically (tempfile + fsync + rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorkbookError> {
        let path = path.as_ref();
        let mut content = serde_json::to_vec_pretty(self)?;
        content.push(b'\n');
        atomic_write(path, &content).map_err(|source| WorkbookError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory keeps the rename on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
