//! Authentication module for the passwordless SMS login and credentials.
//!
//! This module provides:
//! - `LoginFlow`: the multi-redirect browser login walk producing a
//!   verified session cookie
//! - organization lookup over the fresh cookie (`fetch_organizations`,
//!   `fetch_organization_id`)
//! - `CredentialStore`: OS-level cookie storage via keyring
//!
//! There is no refresh mechanism: when the cookie expires server-side the
//! next poll fails and setup has to be run again.

pub mod credentials;
pub mod error;
pub mod login;
pub mod orgs;

pub use credentials::{CredentialBundle, CredentialStore};
pub use error::AuthError;
pub use login::{AuthSession, LoginFlow};
pub use orgs::{fetch_organization_id, fetch_organizations};
