//! Setup wizard: a linear multi-step flow producing a credential bundle.
//!
//! Steps: Phone → VerifyCode → SelectOrganization → Options → Done, with
//! the selection step skipped when the account has exactly one eligible
//! membership. Every failure is caught and mapped to a form-error code so
//! the hosting settings UI can re-present the current step; the wizard
//! itself never aborts.

use thiserror::Error;
use tracing::{error, warn};

use crate::api::VibboClient;
use crate::auth::{
    fetch_organization_id, fetch_organizations, AuthError, AuthSession, CredentialBundle,
    LoginFlow,
};
use crate::config::{Options, MIN_SCAN_INTERVAL_MINUTES};
use crate::models::Membership;

/// Country prefix assumed for phone numbers entered without one
const DEFAULT_PHONE_PREFIX: &str = "+47";

/// Current step of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Phone,
    VerifyCode,
    SelectOrganization,
    Options,
    Done,
}

/// User-facing form error, re-presenting the current step.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("Could not start the login flow")]
    AuthFailed,

    #[error("The verification code was rejected")]
    InvalidCode,

    #[error("Could not connect to Vibbo")]
    CannotConnect,

    #[error("The scan interval must be at least {MIN_SCAN_INTERVAL_MINUTES} minutes")]
    IntervalTooLow,

    #[error("An unexpected error occurred")]
    Unknown,
}

impl FormError {
    /// Stable error code for the host's settings UI translations.
    pub fn code(&self) -> &'static str {
        match self {
            FormError::AuthFailed => "auth_error",
            FormError::InvalidCode => "invalid_code",
            FormError::CannotConnect => "cannot_connect",
            FormError::IntervalTooLow => "interval_too_low",
            FormError::Unknown => "unknown",
        }
    }
}

/// Everything the host needs to persist after a completed setup.
#[derive(Debug, Clone)]
pub struct SetupOutcome {
    pub bundle: CredentialBundle,
    pub options: Options,
    /// Display title for the configured instance (the organization name)
    pub title: String,
}

/// Linear wizard state. One instance per setup attempt.
pub struct SetupFlow {
    step: SetupStep,
    login: LoginFlow,
    phone_number: Option<String>,
    auth_session: Option<AuthSession>,
    cookie: Option<String>,
    memberships: Vec<Membership>,
    selected: Option<Membership>,
    outcome: Option<SetupOutcome>,
}

impl SetupFlow {
    pub fn new() -> Result<Self, AuthError> {
        Ok(Self {
            step: SetupStep::Phone,
            login: LoginFlow::new()?,
            phone_number: None,
            auth_session: None,
            cookie: None,
            memberships: Vec::new(),
            selected: None,
            outcome: None,
        })
    }

    pub fn step(&self) -> SetupStep {
        self.step
    }

    /// Memberships available for the selection step.
    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    /// The completed outcome, once the wizard reaches `Done`.
    pub fn take_outcome(&mut self) -> Option<SetupOutcome> {
        self.outcome.take()
    }

    /// Step 1: take the phone number, walk the login page and send the SMS.
    pub async fn submit_phone(&mut self, input: &str) -> Result<SetupStep, FormError> {
        let phone = normalize_phone(input);

        let auth_session = self.login.start().await.map_err(|err| {
            error!(error = %err, "Login flow start failed");
            phone_step_error(&err)
        })?;

        self.login
            .request_sms_code(&auth_session, &phone)
            .await
            .map_err(|err| {
                error!(error = %err, "SMS code request failed");
                phone_step_error(&err)
            })?;

        self.phone_number = Some(phone);
        self.auth_session = Some(auth_session);
        self.step = SetupStep::VerifyCode;
        Ok(self.step)
    }

    /// Step 2: verify the SMS code, then fetch the account's organizations.
    pub async fn submit_code(&mut self, code: &str) -> Result<SetupStep, FormError> {
        let (Some(auth_session), Some(phone)) = (&self.auth_session, &self.phone_number) else {
            warn!("Verification submitted before the phone step");
            return Err(FormError::Unknown);
        };

        let cookie = self
            .login
            .verify_code_and_get_cookie(auth_session, phone, code.trim())
            .await
            .map_err(|err| {
                error!(error = %err, "Verification failed");
                verify_step_error(&err)
            })?;

        let client = VibboClient::new(&cookie).map_err(|_| FormError::Unknown)?;
        let memberships = fetch_organizations(&client).await.map_err(|err| {
            error!(error = %err, "Organization fetch failed");
            verify_step_error(&err)
        })?;

        self.cookie = Some(cookie);
        Ok(self.apply_memberships(memberships))
    }

    /// Step 3: pick an organization by slug.
    pub fn select_organization(&mut self, slug: &str) -> Result<SetupStep, FormError> {
        let Some(membership) = self.memberships.iter().find(|m| m.slug == slug) else {
            warn!(slug, "Unknown organization selected");
            return Err(FormError::Unknown);
        };

        self.selected = Some(membership.clone());
        self.step = SetupStep::Options;
        Ok(self.step)
    }

    /// Step 4: validate the scan interval, resolve the organization id and
    /// finish the wizard.
    pub async fn submit_options(&mut self, scan_interval: u64) -> Result<SetupStep, FormError> {
        validate_scan_interval(scan_interval)?;

        let (Some(membership), Some(cookie)) = (&self.selected, &self.cookie) else {
            warn!("Options submitted before organization selection");
            return Err(FormError::Unknown);
        };

        let client = VibboClient::new(cookie).map_err(|_| FormError::Unknown)?;
        let organization_id = fetch_organization_id(&client, &membership.slug)
            .await
            .map_err(|err| {
                error!(error = %err, "Organization id lookup failed");
                options_step_error(&err)
            })?;

        self.outcome = Some(SetupOutcome {
            bundle: CredentialBundle {
                cookie: cookie.clone(),
                organization_id,
                organization_slug: membership.slug.clone(),
            },
            options: Options { scan_interval },
            title: membership.name.clone(),
        });
        self.step = SetupStep::Done;
        Ok(self.step)
    }

    /// Store the fetched memberships and decide the next step: exactly one
    /// eligible membership skips the selection step.
    fn apply_memberships(&mut self, memberships: Vec<Membership>) -> SetupStep {
        self.memberships = memberships;
        if self.memberships.len() == 1 {
            self.selected = Some(self.memberships[0].clone());
            self.step = SetupStep::Options;
        } else {
            self.step = SetupStep::SelectOrganization;
        }
        self.step
    }
}

/// Normalize user phone input: strip whitespace, assume the default country
/// prefix when none is given.
pub fn normalize_phone(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("{}{}", DEFAULT_PHONE_PREFIX, trimmed)
    }
}

/// Reject intervals below the minimum; the options form re-presents.
pub fn validate_scan_interval(minutes: u64) -> Result<(), FormError> {
    if minutes < MIN_SCAN_INTERVAL_MINUTES {
        return Err(FormError::IntervalTooLow);
    }
    Ok(())
}

fn phone_step_error(err: &AuthError) -> FormError {
    match err {
        AuthError::Network(_) => FormError::Unknown,
        _ => FormError::AuthFailed,
    }
}

fn verify_step_error(err: &AuthError) -> FormError {
    match err {
        AuthError::VerificationRejected { .. } => FormError::InvalidCode,
        AuthError::Network(_) => FormError::Unknown,
        _ => FormError::CannotConnect,
    }
}

fn options_step_error(err: &AuthError) -> FormError {
    match err {
        AuthError::Network(_) => FormError::Unknown,
        _ => FormError::CannotConnect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(name: &str, slug: &str) -> Membership {
        Membership {
            name: name.to_string(),
            slug: slug.to_string(),
            obos_company_number: String::new(),
            roles: vec![],
        }
    }

    #[test]
    fn test_normalize_phone_adds_prefix() {
        assert_eq!(normalize_phone("98765432"), "+4798765432");
        assert_eq!(normalize_phone("  98765432  "), "+4798765432");
    }

    #[test]
    fn test_normalize_phone_keeps_existing_prefix() {
        assert_eq!(normalize_phone("+4698765432"), "+4698765432");
    }

    #[test]
    fn test_scan_interval_minimum() {
        assert_eq!(validate_scan_interval(4), Err(FormError::IntervalTooLow));
        assert!(validate_scan_interval(5).is_ok());
        assert!(validate_scan_interval(30).is_ok());
    }

    #[test]
    fn test_single_membership_skips_selection() {
        let mut flow = SetupFlow::new().expect("flow");
        let step = flow.apply_memberships(vec![membership("Solsiden", "solsiden")]);
        assert_eq!(step, SetupStep::Options);
        assert_eq!(flow.selected.as_ref().map(|m| m.slug.as_str()), Some("solsiden"));
    }

    #[test]
    fn test_multiple_memberships_require_selection() {
        let mut flow = SetupFlow::new().expect("flow");
        let step = flow.apply_memberships(vec![
            membership("Solsiden", "solsiden"),
            membership("Gamlebyen", "gamlebyen"),
        ]);
        assert_eq!(step, SetupStep::SelectOrganization);
        assert!(flow.selected.is_none());

        let step = flow.select_organization("gamlebyen").expect("known slug");
        assert_eq!(step, SetupStep::Options);
        assert_eq!(flow.selected.as_ref().map(|m| m.slug.as_str()), Some("gamlebyen"));
    }

    #[test]
    fn test_unknown_organization_selection() {
        let mut flow = SetupFlow::new().expect("flow");
        flow.apply_memberships(vec![
            membership("Solsiden", "solsiden"),
            membership("Gamlebyen", "gamlebyen"),
        ]);
        assert_eq!(flow.select_organization("nope"), Err(FormError::Unknown));
    }

    #[tokio::test]
    async fn test_low_interval_rejected_before_any_network_call() {
        let mut flow = SetupFlow::new().expect("flow");
        flow.apply_memberships(vec![membership("Solsiden", "solsiden")]);

        let result = flow.submit_options(3).await;
        assert_eq!(result, Err(FormError::IntervalTooLow));
        assert_eq!(flow.step(), SetupStep::Options);
    }

    #[tokio::test]
    async fn test_code_before_phone_is_unknown() {
        let mut flow = SetupFlow::new().expect("flow");
        assert_eq!(flow.submit_code("123456").await, Err(FormError::Unknown));
    }

    #[test]
    fn test_form_error_codes() {
        assert_eq!(FormError::AuthFailed.code(), "auth_error");
        assert_eq!(FormError::InvalidCode.code(), "invalid_code");
        assert_eq!(FormError::CannotConnect.code(), "cannot_connect");
        assert_eq!(FormError::IntervalTooLow.code(), "interval_too_low");
        assert_eq!(FormError::Unknown.code(), "unknown");
    }

    #[test]
    fn test_verify_step_error_mapping() {
        let rejected = AuthError::VerificationRejected {
            status: reqwest::StatusCode::FORBIDDEN,
            body: "wrong code".to_string(),
        };
        assert_eq!(verify_step_error(&rejected), FormError::InvalidCode);
        assert_eq!(
            verify_step_error(&AuthError::NoOrganizations),
            FormError::CannotConnect
        );
        assert_eq!(
            verify_step_error(&AuthError::MissingSessionCookie),
            FormError::CannotConnect
        );
    }

    #[test]
    fn test_phone_step_error_mapping() {
        assert_eq!(
            phone_step_error(&AuthError::MissingToken("_csrf")),
            FormError::AuthFailed
        );
    }
}
