use thiserror::Error;

/// Failure of a single poll or lookup against the Vibbo GraphQL API.
///
/// The host layer treats any of these as "update failed" and marks the
/// entity unavailable until the next successful cycle. An expired session
/// cookie surfaces here as `Status(401/403)` or a `GraphQl` auth message;
/// there is no refresh mechanism, re-running setup is the only recovery.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Vibbo API returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Vibbo API error: {0}")]
    GraphQl(String),

    #[error("Invalid response from Vibbo API")]
    MalformedPayload,

    #[error("Error communicating with Vibbo: {0}")]
    Network(#[from] reqwest::Error),
}

/// Maximum length for upstream response bodies embedded in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i <= MAX_ERROR_BODY_LENGTH)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }
}
