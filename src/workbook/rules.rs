//! Rule objects stored on a sheet.
//!
//! Rules are immutable values. Changing one means `copy()` into a builder,
//! mutate the criteria, and `build()` a replacement; every property outside
//! the criteria travels through the builder untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleBuildError {
    #[error("custom formula criteria requires a non-empty formula")]
    MissingFormula,

    #[error("conditional format rule must cover at least one range")]
    NoRanges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriteriaType {
    CustomFormula,
    Blank,
    NotBlank,
    TextContains,
    TextDoesNotContain,
    TextEqualTo,
    NumberBetween,
    NumberEqualTo,
    NumberGreaterThan,
    NumberLessThan,
    DateBefore,
    DateAfter,
    ValueInList,
    ValueInRange,
    Checkbox,
}

impl CriteriaType {
    pub fn is_custom_formula(self) -> bool {
        self == CriteriaType::CustomFormula
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriteriaValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CriteriaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CriteriaValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// The formula payload of custom-formula criteria: the first value, when it
/// is non-empty text.
fn custom_formula(criteria_type: Option<CriteriaType>, values: &[CriteriaValue]) -> Option<&str> {
    if !criteria_type.is_some_and(CriteriaType::is_custom_formula) {
        return None;
    }
    values
        .first()
        .and_then(CriteriaValue::as_text)
        .filter(|formula| !formula.is_empty())
}

/// 1-based rectangular range on one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRange {
    pub start_row: u32,
    pub start_column: u32,
    pub num_rows: u32,
    pub num_columns: u32,
}

impl GridRange {
    pub fn new(start_row: u32, start_column: u32, num_rows: u32, num_columns: u32) -> Self {
        Self {
            start_row,
            start_column,
            num_rows,
            num_columns,
        }
    }

    /// One past the last covered column, or `None` when the range overflows.
    pub fn end_column(&self) -> Option<u32> {
        self.start_column.checked_add(self.num_columns)
    }

    /// Absolute column numbers covered by this range, clamped at `u32::MAX`.
    pub fn columns(&self) -> Range<u32> {
        self.start_column..self.start_column.saturating_add(self.num_columns)
    }
}

/// One cell of the used range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Cell {
    pub fn value(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn formula(formula: impl Into<String>) -> Self {
        Self {
            formula: Some(formula.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Data validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidation {
    pub criteria_type: CriteriaType,
    #[serde(default)]
    pub criteria_values: Vec<CriteriaValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// `false` rejects invalid input; `true` only shows a warning.
    #[serde(default)]
    pub allow_invalid: bool,
}

/// Validation rules of a used range, `None` where a cell has no rule.
pub type ValidationGrid = Vec<Vec<Option<DataValidation>>>;

impl DataValidation {
    pub fn custom_formula(formula: impl Into<String>) -> Self {
        Self {
            criteria_type: CriteriaType::CustomFormula,
            criteria_values: vec![CriteriaValue::Text(formula.into())],
            help_text: None,
            allow_invalid: false,
        }
    }

    pub fn formula(&self) -> Option<&str> {
        custom_formula(Some(self.criteria_type), &self.criteria_values)
    }

    pub fn copy(&self) -> DataValidationBuilder {
        DataValidationBuilder { rule: self.clone() }
    }
}

#[derive(Debug, Clone)]
#[must_use = "builder does nothing until build() is called"]
pub struct DataValidationBuilder {
    rule: DataValidation,
}

impl DataValidationBuilder {
    pub fn require_formula_satisfied(mut self, formula: impl Into<String>) -> Self {
        self.rule.criteria_type = CriteriaType::CustomFormula;
        self.rule.criteria_values = vec![CriteriaValue::Text(formula.into())];
        self
    }

    pub fn build(self) -> Result<DataValidation, RuleBuildError> {
        if self.rule.criteria_type.is_custom_formula() && self.rule.formula().is_none() {
            return Err(RuleBuildError::MissingFormula);
        }
        Ok(self.rule)
    }
}

// ---------------------------------------------------------------------------
// Conditional formatting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Boolean {
        criteria_type: CriteriaType,
        #[serde(default)]
        criteria_values: Vec<CriteriaValue>,
        #[serde(default)]
        format: TextFormat,
    },
    Gradient {
        min_color: String,
        max_color: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalFormatRule {
    pub ranges: Vec<GridRange>,
    pub condition: Condition,
}

impl ConditionalFormatRule {
    pub fn custom_formula(
        range: GridRange,
        formula: impl Into<String>,
        format: TextFormat,
    ) -> Self {
        Self {
            ranges: vec![range],
            condition: Condition::Boolean {
                criteria_type: CriteriaType::CustomFormula,
                criteria_values: vec![CriteriaValue::Text(formula.into())],
                format,
            },
        }
    }

    /// Criteria of a boolean condition; gradient rules have none.
    pub fn boolean_criteria(&self) -> Option<(CriteriaType, &[CriteriaValue])> {
        match &self.condition {
            Condition::Boolean {
                criteria_type,
                criteria_values,
                ..
            } => Some((*criteria_type, criteria_values)),
            Condition::Gradient { .. } => None,
        }
    }

    pub fn copy(&self) -> ConditionalFormatRuleBuilder {
        ConditionalFormatRuleBuilder { rule: self.clone() }
    }
}

#[derive(Debug, Clone)]
#[must_use = "builder does nothing until build() is called"]
pub struct ConditionalFormatRuleBuilder {
    rule: ConditionalFormatRule,
}

impl ConditionalFormatRuleBuilder {
    /// Replace the criteria, keeping the rule's format and ranges.
    pub fn with_criteria(
        mut self,
        criteria_type: CriteriaType,
        values: Vec<CriteriaValue>,
    ) -> Self {
        let format = match &self.rule.condition {
            Condition::Boolean { format, .. } => format.clone(),
            Condition::Gradient { .. } => TextFormat::default(),
        };
        self.rule.condition = Condition::Boolean {
            criteria_type,
            criteria_values: values,
            format,
        };
        self
    }

    pub fn build(self) -> Result<ConditionalFormatRule, RuleBuildError> {
        if self.rule.ranges.is_empty() {
            return Err(RuleBuildError::NoRanges);
        }
        if let Some((criteria_type, values)) = self.rule.boolean_criteria() {
            if criteria_type.is_custom_formula()
                && custom_formula(Some(criteria_type), values).is_none()
            {
                return Err(RuleBuildError::MissingFormula);
            }
        }
        Ok(self.rule)
    }
}

// ---------------------------------------------------------------------------
// Filters, filter views and slicers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria_type: Option<CriteriaType>,
    #[serde(default)]
    pub criteria_values: Vec<CriteriaValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_foreground_color: Option<String>,
}

impl FilterCriteria {
    pub fn custom_formula(formula: impl Into<String>) -> Self {
        Self {
            criteria_type: Some(CriteriaType::CustomFormula),
            criteria_values: vec![CriteriaValue::Text(formula.into())],
            ..Self::default()
        }
    }

    pub fn formula(&self) -> Option<&str> {
        custom_formula(self.criteria_type, &self.criteria_values)
    }

    pub fn copy(&self) -> FilterCriteriaBuilder {
        FilterCriteriaBuilder {
            criteria: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
#[must_use = "builder does nothing until build() is called"]
pub struct FilterCriteriaBuilder {
    criteria: FilterCriteria,
}

impl FilterCriteriaBuilder {
    pub fn when_formula_satisfied(mut self, formula: impl Into<String>) -> Self {
        self.criteria.criteria_type = Some(CriteriaType::CustomFormula);
        self.criteria.criteria_values = vec![CriteriaValue::Text(formula.into())];
        self
    }

    pub fn build(self) -> Result<FilterCriteria, RuleBuildError> {
        if self.criteria.criteria_type == Some(CriteriaType::CustomFormula)
            && self.criteria.formula().is_none()
        {
            return Err(RuleBuildError::MissingFormula);
        }
        Ok(self.criteria)
    }
}

/// The sheet's single active filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub range: GridRange,
    /// Criteria keyed by absolute 1-based column.
    #[serde(default)]
    pub criteria: BTreeMap<u32, FilterCriteria>,
}

impl Filter {
    pub fn column_criteria(&self, column: u32) -> Option<&FilterCriteria> {
        self.criteria.get(&column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterView {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub range: GridRange,
    #[serde(default)]
    pub criteria: BTreeMap<u32, FilterCriteria>,
}

impl FilterView {
    pub fn column_criteria(&self, column: u32) -> Option<&FilterCriteria> {
        self.criteria.get(&column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slicer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<FilterCriteria>,
}

/// A document-level binding from a name to a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    pub name: String,
    /// A1 reference, e.g. `Rates!B2:B20`.
    pub range: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_validation_copy_keeps_help_text() {
        let mut rule = DataValidation::custom_formula("=Rate>0");
        rule.help_text = Some("positive only".to_string());
        rule.allow_invalid = true;

        let rebuilt = rule.copy().require_formula_satisfied("=Cost>0").build().unwrap();
        assert_eq!(rebuilt.formula(), Some("=Cost>0"));
        assert_eq!(rebuilt.help_text.as_deref(), Some("positive only"));
        assert!(rebuilt.allow_invalid);
    }

    #[test]
    fn test_formula_requires_custom_type() {
        let rule = DataValidation {
            criteria_type: CriteriaType::TextContains,
            criteria_values: vec![CriteriaValue::Text("Rate".to_string())],
            help_text: None,
            allow_invalid: false,
        };
        assert_eq!(rule.formula(), None);
        assert_eq!(FilterCriteria::custom_formula("").formula(), None);
    }

    #[test]
    fn test_empty_formula_fails_to_build() {
        let err = FilterCriteria::default()
            .copy()
            .when_formula_satisfied("")
            .build()
            .unwrap_err();
        assert_eq!(err, RuleBuildError::MissingFormula);
    }

    #[test]
    fn test_conditional_format_keeps_format_and_ranges() {
        let format = TextFormat {
            background: Some("#ff0000".to_string()),
            bold: true,
            ..TextFormat::default()
        };
        let rule = ConditionalFormatRule::custom_formula(
            GridRange::new(1, 1, 10, 2),
            "=A1>Rate",
            format.clone(),
        );

        let rebuilt = rule
            .copy()
            .with_criteria(
                CriteriaType::CustomFormula,
                vec![CriteriaValue::Text("=A1>Cost".to_string())],
            )
            .build()
            .unwrap();

        assert_eq!(rebuilt.ranges, rule.ranges);
        match rebuilt.condition {
            Condition::Boolean { format: kept, .. } => assert_eq!(kept, format),
            Condition::Gradient { .. } => panic!("expected boolean condition"),
        }
    }

    #[test]
    fn test_conditional_format_without_ranges_fails() {
        let mut rule = ConditionalFormatRule::custom_formula(
            GridRange::new(1, 1, 1, 1),
            "=Rate",
            TextFormat::default(),
        );
        rule.ranges.clear();
        assert_eq!(rule.copy().build().unwrap_err(), RuleBuildError::NoRanges);
    }

    #[test]
    fn test_grid_range_columns() {
        let range = GridRange::new(1, 3, 5, 2);
        assert_eq!(range.columns().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(range.end_column(), Some(5));
    }

    #[test]
    fn test_grid_range_columns_saturate() {
        let range = GridRange::new(1, u32::MAX, 5, 2);
        assert_eq!(range.end_column(), None);
        assert_eq!(range.columns().count(), 0);
    }
}
