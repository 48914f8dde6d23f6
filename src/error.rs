use thiserror::Error;

/// Type alias for Result with SweepError
pub type Result<T> = std::result::Result<T, SweepError>;

/// Error types for the mailbox cleanup engine
#[derive(Error, Debug)]
pub enum SweepError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    Api(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded - should retry after specified seconds
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Resource not found (404)
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Invalid message format or parsing error
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// The criteria builder produced nothing actionable; refusing to submit
    /// a vacuous filter to the service
    #[error("Filter criteria is empty: no marked sender has an extractable email")]
    EmptyCriteria,

    /// Filter-related errors
    #[error("Filter error: {0}")]
    Filter(String),

    /// A bulk trash run aborted partway through. Mutations already applied
    /// are not rolled back; the counts describe progress up to the failure.
    #[error(
        "Sweep aborted on page {page} at message {message_id}: {source} \
         (trashed {trashed}, skipped {skipped}, {unprocessed} unprocessed on page)"
    )]
    SweepAborted {
        page: usize,
        message_id: String,
        trashed: usize,
        skipped: usize,
        unprocessed: usize,
        #[source]
        source: Box<SweepError>,
    },

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic catch-all error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SweepError {
    /// Check if the error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SweepError::RateLimitExceeded { .. }
                | SweepError::Server { .. }
                | SweepError::Network(_)
        )
    }

    /// Check if the error is permanent and should not be retried
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

/// Parse the Retry-After header from an HTTP response
///
/// The Retry-After header can be specified in two formats:
/// 1. Delay-seconds: An integer indicating seconds to wait (e.g., "120")
/// 2. HTTP-date: An HTTP date format (e.g., "Wed, 21 Oct 2015 07:28:00 GMT")
///
/// Returns the number of seconds to wait. If the header is missing or invalid,
/// returns a default of 5 seconds.
fn parse_retry_after_header<B>(response: &hyper::Response<B>) -> u64 {
    const DEFAULT_RETRY_AFTER: u64 = 5;

    if let Some(retry_after_value) = response.headers().get("retry-after") {
        if let Ok(retry_after_str) = retry_after_value.to_str() {
            if let Ok(seconds) = retry_after_str.parse::<u64>() {
                return seconds;
            }

            if let Ok(http_date) = httpdate::parse_http_date(retry_after_str) {
                let now = std::time::SystemTime::now();
                if let Ok(duration) = http_date.duration_since(now) {
                    return duration.as_secs();
                }
            }
        }
    }

    DEFAULT_RETRY_AFTER
}

impl From<google_gmail1::Error> for SweepError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // HTTP response with status code (non-success responses)
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    // Rate limiting - transient
                    429 => {
                        let retry_after = parse_retry_after_header(response);
                        SweepError::RateLimitExceeded { retry_after }
                    }
                    404 => SweepError::MessageNotFound("Resource not found".to_string()),
                    400 => SweepError::BadRequest(message),
                    403 => SweepError::Forbidden(message),
                    // Server errors - transient
                    500..=599 => SweepError::Server {
                        status: status_code,
                        message,
                    },
                    _ => SweepError::Api(message),
                }
            }
            // BadRequest variant (request not understood by server)
            google_gmail1::Error::BadRequest(ref err) => SweepError::BadRequest(format!("{}", err)),
            // Network/connection errors - transient
            google_gmail1::Error::HttpError(ref err) => {
                SweepError::Network(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => SweepError::Network(err.to_string()),
            _ => SweepError::Api(error.to_string()),
        }
    }
}
