use thiserror::Error;

/// A step-local input problem. Never leaves the onboarding wizard.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields")]
    MissingPersonalInfo,
    #[error("Please select your region")]
    MissingRegion,
    #[error("GPA '{0}' is not a number")]
    UnparseableGpa(String),
    #[error("GPA {0} must be between 0.0 and 4.0")]
    GpaOutOfRange(f64),
    #[error("'{action}' is not available from {step}")]
    InvalidTransition {
        action: &'static str,
        step: &'static str,
    },
}

/// Failures reported by the remote grant API.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid API base URL {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity store unavailable: {0}")]
    Database(#[from] sqlx::Error),
    #[error("identity store migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Why a wizard submission did not complete.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
