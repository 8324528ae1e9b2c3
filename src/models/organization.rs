use serde::{Deserialize, Serialize};

/// An organization membership for the logged-in user.
///
/// Produced by the organization-list query during setup; only memberships
/// with the service enabled upstream are represented here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub name: String,
    pub slug: String,
    #[serde(rename = "obosCompanyNumber", default)]
    pub obos_company_number: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Membership {
    pub fn display_label(&self) -> String {
        if self.obos_company_number.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.obos_company_number)
        }
    }
}
