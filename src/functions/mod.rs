//! Document-wide computed function definitions.
//!
//! Named functions are not sheet-scoped, so they are read and updated once per
//! sweep through a [`NamedFunctionService`]. The service is optional and is
//! only consulted when the caller attaches one.

pub mod client;
pub mod errors;

use serde::{Deserialize, Serialize};

pub use client::{SheetsApiClient, DEFAULT_ENDPOINT, DEFAULT_TOKEN_ENV};
pub use errors::ServiceError;

/// Field mask sent with every partial update; only the body is replaced.
pub const FUNCTION_BODY_FIELD: &str = "functionBody";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedFunction {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub parameters: Vec<FunctionParameter>,
    #[serde(default)]
    pub function_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Partial update of one named function, restricted to `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNamedFunction {
    pub named_function: NamedFunction,
    pub fields: String,
}

impl UpdateNamedFunction {
    /// Request replacing only the body of `function`.
    pub fn body(mut function: NamedFunction, body: String) -> Self {
        function.function_body = body;
        Self {
            named_function: function,
            fields: FUNCTION_BODY_FIELD.to_string(),
        }
    }
}

/// Remote (or local) store of named function definitions.
///
/// Implementations perform no retries; a failed call is reported once.
pub trait NamedFunctionService {
    fn list_named_functions(&mut self) -> Result<Vec<NamedFunction>, ServiceError>;

    /// Submit every update in one call.
    fn batch_update(&mut self, updates: Vec<UpdateNamedFunction>) -> Result<(), ServiceError>;
}
