use reqwest::StatusCode;
use thiserror::Error;

use crate::api::UpdateError;

/// Authentication failure, naming the step of the login walk that failed.
///
/// Surfaced to the setup wizard, which maps each variant to a form-error
/// code for the host's settings UI.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Could not find {0} in login page")]
    MissingToken(&'static str),

    #[error("Failed to request SMS code: {status} {body}")]
    SmsRequestFailed { status: StatusCode, body: String },

    #[error("Verification failed: {status} {body}")]
    VerificationRejected { status: StatusCode, body: String },

    #[error("Failed to obtain Vibbo session cookies after login")]
    MissingSessionCookie,

    #[error("No viewer data in response")]
    MissingViewer,

    #[error("No Vibbo-enabled organizations found for this account")]
    NoOrganizations,

    #[error("Could not find organization for slug: {0}")]
    UnknownOrganization(String),

    #[error("Organization has no ID: {0}")]
    MissingOrganizationId(String),

    #[error(transparent)]
    Api(#[from] UpdateError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
