//! Named-function service backed by the spreadsheet REST API.

use crate::functions::{NamedFunction, NamedFunctionService, ServiceError, UpdateNamedFunction};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

/// Default environment variable holding the OAuth bearer token.
pub const DEFAULT_TOKEN_ENV: &str = "SHEETS_API_TOKEN";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetFunctions {
    #[serde(default)]
    named_functions: Vec<NamedFunction>,
}

#[derive(Serialize)]
struct BatchUpdateRequest {
    requests: Vec<Request>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    update_named_function: UpdateNamedFunction,
}

/// Blocking client for one spreadsheet.
///
/// No client timeout and no retries: a failed call surfaces once as a
/// [`ServiceError`] and the caller decides what to report.
pub struct SheetsApiClient {
    http: Client,
    endpoint: String,
    spreadsheet_id: String,
    token: String,
}

impl SheetsApiClient {
    pub fn new(
        endpoint: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .user_agent(concat!("named-range-renamer/", env!("CARGO_PKG_VERSION")))
            .timeout(None)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
        })
    }

    /// Build a client reading its bearer token from `token_env`.
    pub fn from_env(
        endpoint: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        token_env: &str,
    ) -> Result<Self, ServiceError> {
        let token = std::env::var(token_env).map_err(|_| ServiceError::MissingToken {
            var: token_env.to_string(),
        })?;
        Self::new(endpoint, spreadsheet_id, token)
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}",
            self.endpoint.trim_end_matches('/'),
            self.spreadsheet_id
        )
    }
}

fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ServiceError::Unauthorized {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

impl NamedFunctionService for SheetsApiClient {
    fn list_named_functions(&mut self) -> Result<Vec<NamedFunction>, ServiceError> {
        let url = format!("{}?fields=namedFunctions", self.spreadsheet_url());
        let response = self.http.get(url).bearer_auth(&self.token).send()?;
        let body = check_status(response)?.text()?;
        let parsed: SpreadsheetFunctions = serde_json::from_str(&body)?;
        Ok(parsed.named_functions)
    }

    fn batch_update(&mut self, updates: Vec<UpdateNamedFunction>) -> Result<(), ServiceError> {
        if updates.is_empty() {
            return Ok(());
        }

        let request = BatchUpdateRequest {
            requests: updates
                .into_iter()
                .map(|update| Request {
                    update_named_function: update,
                })
                .collect(),
        };

        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()?;
        check_status(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_url_trims_trailing_slash() {
        let client = SheetsApiClient::new("https://example.test/v4/", "abc123", "t").unwrap();
        assert_eq!(client.spreadsheet_url(), "https://example.test/v4/spreadsheets/abc123");
    }

    #[test]
    fn test_batch_request_wire_shape() {
        let update = UpdateNamedFunction::body(
            NamedFunction {
                name: "fn-1".to_string(),
                display_name: "MARGIN".to_string(),
                parameters: Vec::new(),
                function_body: "=Rate".to_string(),
            },
            "=Cost".to_string(),
        );
        let request = BatchUpdateRequest {
            requests: vec![Request {
                update_named_function: update,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["requests"][0]["updateNamedFunction"]["namedFunction"]["functionBody"],
            "=Cost"
        );
    }

    #[test]
    fn test_missing_token_env() {
        let err =
            SheetsApiClient::from_env(DEFAULT_ENDPOINT, "abc", "NRR_TEST_TOKEN_THAT_IS_NOT_SET")
                .err()
                .unwrap();
        assert!(matches!(err, ServiceError::MissingToken { .. }));
    }
}
