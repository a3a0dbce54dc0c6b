use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the groups API itself.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to groups API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("groups API answered with status {0}")]
    Status(StatusCode),

    #[error("invalid groups API host {0}")]
    InvalidHost(String),
}

/// Failure of a store action.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The API processed the call and said no.
    #[error("{reason}")]
    Rejected { reason: String },

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StoreError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        StoreError::Rejected {
            reason: reason.into(),
        }
    }

    /// Human readable reason, suitable for showing next to the form that
    /// triggered the action.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

pub type ActionResult = Result<(), StoreError>;
