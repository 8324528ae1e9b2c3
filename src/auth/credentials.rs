use anyhow::{Context, Result};
use keyring::Entry;

/// Keychain service name for stored session cookies
const SERVICE_NAME: &str = "vibbo-feed";

/// The long-lived secret artifact produced by setup.
///
/// Valid only as long as the cookie has not expired server-side; expiry
/// surfaces as an update failure and requires re-running setup.
#[derive(Debug, Clone)]
pub struct CredentialBundle {
    pub cookie: String,
    pub organization_id: String,
    pub organization_slug: String,
}

/// OS keychain storage for the session cookie, keyed by organization slug.
///
/// The non-secret half of the bundle (organization id and slug) lives in
/// the JSON config file; see [`crate::config::StoredConfig`].
pub struct CredentialStore;

impl CredentialStore {
    /// Store the session cookie for an organization in the OS keychain
    pub fn store(organization_slug: &str, cookie: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, organization_slug)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(cookie)
            .context("Failed to store session cookie in keychain")?;
        Ok(())
    }

    /// Retrieve the session cookie for an organization from the OS keychain
    pub fn get_cookie(organization_slug: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, organization_slug)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve session cookie from keychain")
    }

    /// Delete the stored cookie for an organization
    pub fn delete(organization_slug: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, organization_slug)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete session cookie from keychain")?;
        Ok(())
    }

    /// Check if a cookie is stored for an organization
    pub fn has_cookie(organization_slug: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, organization_slug) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}
