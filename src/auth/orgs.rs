//! Organization lookup, layered on the session cookie from the login walk.
//!
//! Two GraphQL operations run once during setup: list the account's
//! memberships, and resolve the selected slug to the opaque organization id
//! the activity-stream query wants.

use serde::Deserialize;
use tracing::debug;

use crate::api::VibboClient;
use crate::models::Membership;

use super::AuthError;

const ORGANIZATIONS_QUERY: &str = r#"query vibboOrganizations {
  viewer {
    id
    memberships {
      name
      roles
      obosCompanyNumber
      slug: organizationSlug
      vibboEnabled
      cluster
      __typename
    }
    __typename
  }
}"#;

const ORGANIZATION_QUERY: &str = r#"query vibboOrganization($organizationSlug: OrganizationID!) {
  organization(id: $organizationSlug) {
    id
    name
    slug
    __typename
  }
}"#;

/// Fetch the account's memberships, keeping only Vibbo-enabled ones.
pub async fn fetch_organizations(client: &VibboClient) -> Result<Vec<Membership>, AuthError> {
    let data: OrganizationsData = client
        .graphql("vibboOrganizations", ORGANIZATIONS_QUERY, serde_json::json!({}))
        .await?;

    let viewer = data.viewer.ok_or(AuthError::MissingViewer)?;
    let memberships = eligible_memberships(viewer.memberships);

    debug!(count = memberships.len(), "Fetched organization memberships");

    if memberships.is_empty() {
        return Err(AuthError::NoOrganizations);
    }

    Ok(memberships)
}

/// Resolve a slug to the opaque base64 organization id
/// (e.g. `T3JnYW5pemF0aW9uOi0...`).
pub async fn fetch_organization_id(
    client: &VibboClient,
    slug: &str,
) -> Result<String, AuthError> {
    let variables = serde_json::json!({ "organizationSlug": slug });
    let data: OrganizationData = client
        .graphql("vibboOrganization", ORGANIZATION_QUERY, variables)
        .await?;

    let org = data
        .organization
        .ok_or_else(|| AuthError::UnknownOrganization(slug.to_string()))?;

    match org.id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AuthError::MissingOrganizationId(slug.to_string())),
    }
}

fn eligible_memberships(raw: Vec<RawMembership>) -> Vec<Membership> {
    raw.into_iter()
        .filter(|m| m.vibbo_enabled)
        .map(|m| Membership {
            name: m.name,
            slug: m.slug,
            obos_company_number: m.obos_company_number.unwrap_or_default(),
            roles: m.roles,
        })
        .collect()
}

// Internal GraphQL response types for parsing

#[derive(Debug, Deserialize)]
struct OrganizationsData {
    viewer: Option<Viewer>,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    #[serde(default)]
    memberships: Vec<RawMembership>,
}

#[derive(Debug, Deserialize)]
struct RawMembership {
    #[serde(default)]
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(rename = "obosCompanyNumber", default)]
    obos_company_number: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(rename = "vibboEnabled", default)]
    vibbo_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct OrganizationData {
    organization: Option<OrganizationNode>,
}

#[derive(Debug, Deserialize)]
struct OrganizationNode {
    id: Option<String>,
}
