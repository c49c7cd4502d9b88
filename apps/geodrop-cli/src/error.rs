use geodrop_claims::{ClaimError, ClaimErrorKind, ErrorResponse};
use geodrop_db::DbError;
use geodrop_geo::GeoError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("{0}")]
    Claim(#[from] ClaimError),

    #[error("Invalid coordinates: {0}")]
    Geo(#[from] GeoError),

    #[error("Claim rejected ({kind}): {detail}")]
    Rejected { kind: ClaimErrorKind, detail: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),
}

impl From<ErrorResponse> for CliError {
    fn from(response: ErrorResponse) -> Self {
        CliError::Rejected {
            kind: response.kind,
            detail: response.detail,
        }
    }
}
