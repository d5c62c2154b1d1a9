use std::time::Duration;

/// Error returned by one of the external collaborators
/// (orders feed, asset metadata, spot rates, subscriber sink).
///
/// Never fatal within this crate: the watch path skips the tick,
/// the query path hands it back to the caller to phrase a reply.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        if let Some(status) = value.status() {
            return Self::Status {
                status: status.as_u16(),
                url: value.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<url::ParseError> for ProviderError {
    fn from(value: url::ParseError) -> Self {
        Self::Transport(value.to_string())
    }
}

/// Bounds a provider call by `limit`, mapping expiry to [`ProviderError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or(Err(ProviderError::Timeout(limit)))
}
