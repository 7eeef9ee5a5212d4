use thiserror::Error;

/// Outcome classification for a settled fetch. Cancellation is a
/// first-class variant rather than a flag on a generic error so the
/// poller's handling of it is exhaustive: a `Canceled` fetch carries no
/// information about the resource and is never surfaced to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request canceled")]
    Canceled,

    #[error("Error getting data from server: {message}")]
    Failed { message: String },
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    #[allow(dead_code)]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::failed(err.to_string())
    }
}
