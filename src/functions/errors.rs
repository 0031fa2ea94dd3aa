use thiserror::Error;

/// Failure of the named-function service. Isolated to that surface alone.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(
        "not authorized to access named functions (HTTP {status}); grant the spreadsheets scope"
    )]
    Unauthorized { status: u16 },

    #[error("named-function service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("named-function service rejected the update: {reason}")]
    Rejected { reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing credentials: environment variable {var} is not set")]
    MissingToken { var: String },
}
