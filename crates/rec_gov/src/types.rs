/// Errors returned by the Rec.gov permit API client.
#[derive(Debug, thiserror::Error)]
pub enum RecGovError {
    /// Non-success response not covered by a more specific variant
    #[error("API error: {0}")]
    ApiError(String),

    /// Server-side failure (HTTP 5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Rate limited by external API
    #[error("Rate limited by external API")]
    RateLimited,

    /// Authentication failed with external service
    #[error("Authentication failed with external service")]
    AuthenticationFailed,

    /// Permit or endpoint not found
    #[error("Permit availability not found")]
    NotFound,

    /// Transport failure, including timeouts
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Data format error: {0}")]
    DataFormat(String),
}

impl RecGovError {
    /// Whether a later attempt at the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RecGovError::Network(_) | RecGovError::RateLimited | RecGovError::ServerError(_) => {
                true
            }
            _ => false,
        }
    }
}
