//! Admin allow-list

use serde::{Deserialize, Serialize};

use super::config::AuthConfig;

/// Profile handed over by the sign-in provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl UserProfile {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Administrador")
    }
}

/// Decides who may edit documents
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    emails: Vec<String>,
    domains: Vec<String>,
}

impl Authorizer {
    pub fn new(emails: &[String], domains: &[String]) -> Self {
        Self {
            emails: emails.iter().map(|e| e.trim().to_lowercase()).collect(),
            domains: domains
                .iter()
                .map(|d| d.trim().trim_start_matches('@').to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.authorized_emails, &config.authorized_domains)
    }

    /// Exact allow-list match, or an address under an allowed domain
    pub fn is_authorized(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return false;
        }
        if self.emails.contains(&email) {
            return true;
        }
        email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| self.domains.iter().any(|d| d == domain))
    }
}
