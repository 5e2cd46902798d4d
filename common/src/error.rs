use thiserror::Error;

use crate::types::SettingName;

/// Failure of a single controller request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Controller URL is not set")]
    Unconfigured,
    #[error("Controller URL is not valid.")]
    InvalidEndpoint { base: String },
    #[error("Request timed out")]
    Timeout,
    #[error("{detail}")]
    Controller { status: u16, detail: String },
    #[error("{0}")]
    Transport(String),
}

impl RequestError {
    /// Builds a controller error, synthesizing the detail from the status when
    /// the response body is empty.
    pub fn controller(status: u16, body: &str) -> Self {
        let detail = if body.is_empty() {
            format!("Controller returned {status}")
        } else {
            body.to_string()
        };
        Self::Controller { status, detail }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{key} response missing value")]
    MissingValue { key: SettingName },
    #[error("{key} response contained an invalid number")]
    InvalidNumber { key: SettingName, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid time value")]
    InvalidTime,
    #[error("From must be earlier than To")]
    StartNotBeforeStop,
    #[error("To must be later than From")]
    StopNotAfterStart,
    #[error("on_duration must be a positive number of minutes")]
    NonPositiveDuration,
}

/// Anything a user-initiated action can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ActionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(RequestError::Timeout))
    }

    /// Text shown on the error line. Timeouts get the action-specific label,
    /// e.g. `"Mode request"` becomes `"Mode request timed out"`.
    pub fn user_message(&self, action: &str) -> String {
        if self.is_timeout() {
            format!("{action} timed out")
        } else {
            self.to_string()
        }
    }
}
