//! Error types for report composition and export

use thiserror::Error;

/// Result type alias for groomcard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or exporting a report
#[derive(Error, Debug)]
pub enum Error {
    /// The source photo could not be decoded or re-encoded
    #[error("Image decoding failed: {0}")]
    DecodeError(String),

    /// Producing the raster snapshot of the report failed
    #[error("Rasterization failed: {0}")]
    RasterizationError(String),

    /// The note rewriting service could not be used
    #[error("Note rewriting unavailable: {0}")]
    RewriteUnavailable(#[from] RewriteError),

    /// Invalid configuration or settings file
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// An export is already running
    #[error("An export is already in progress")]
    Busy,

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// A short suggestion the user can act on after this error.
    pub fn hint(&self) -> &'static str {
        match self {
            Error::DecodeError(_) => "Pick another photo; this one could not be read.",
            Error::RasterizationError(_) => {
                "Try again, lower --pixel-ratio, or take a device screenshot of the preview instead."
            }
            Error::RewriteUnavailable(RewriteError::MissingCredential) => {
                "Configure an API key with `groomcard config set-key <KEY>`; the original notes are kept."
            }
            Error::RewriteUnavailable(_) => "Retry later; the original notes are kept.",
            Error::ConfigError(_) => "Check the settings file or command line flags.",
            Error::Busy => "Wait for the current export to finish.",
            Error::Io(_) => "Check the path and file permissions.",
            Error::Other(_) => "Retry the operation.",
        }
    }
}

/// Failures reported by the note rewriting collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewriteError {
    /// No API key has been configured
    #[error("no API key configured")]
    MissingCredential,

    /// The service refused the request because of quota or rate limits
    #[error("rate limited by the rewriting service")]
    RateLimited,

    /// Request timed out
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with an error status
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The service returned no text
    #[error("the service returned an empty rewrite")]
    EmptyResponse,
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::DecodeError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_errors_convert_and_keep_their_kind() {
        let err: Error = RewriteError::RateLimited.into();
        assert!(matches!(
            err,
            Error::RewriteUnavailable(RewriteError::RateLimited)
        ));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn rasterization_hint_mentions_screenshot() {
        let err = Error::RasterizationError("surface too large".into());
        assert!(err.hint().contains("screenshot"));
    }

    #[test]
    fn missing_credential_hint_points_to_config() {
        let err = Error::from(RewriteError::MissingCredential);
        assert!(err.hint().contains("set-key"));
    }
}
