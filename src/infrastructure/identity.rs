use crate::domain::models::UserId;
use async_trait::async_trait;
use std::collections::HashMap;

/// Profile fields an identity backend may know about a user. All optional;
/// [`DisplayProfile::display_name`] degrades gracefully.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayProfile {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub contact: Option<String>,
}

impl DisplayProfile {
    /// A human-readable name: full name, then given name, then the local
    /// part of the contact address, then a generic placeholder.
    pub fn display_name(&self) -> String {
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => return format!("{given} {family}"),
            (Some(given), None) => return given.clone(),
            _ => {}
        }
        if let Some(contact) = &self.contact {
            if let Some(local) = contact.split('@').next() {
                if !local.is_empty() {
                    return local.to_string();
                }
            }
        }
        "Anonymous Player".to_string()
    }
}

/// Source of user profiles shown to opponents. Lookups are best effort; a
/// `None` means the opponent is presented without a profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn profile(&self, user: &UserId) -> Option<DisplayProfile>;
}

/// Identity backend that knows nobody.
pub struct NullIdentity;

#[async_trait]
impl IdentityProvider for NullIdentity {
    async fn profile(&self, _user: &UserId) -> Option<DisplayProfile> {
        None
    }
}

/// Fixed in-memory directory. Handy for tests and self-hosted setups.
#[derive(Default)]
pub struct StaticDirectory {
    entries: HashMap<UserId, DisplayProfile>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        StaticDirectory {
            entries: HashMap::new(),
        }
    }

    pub fn with(mut self, user: &str, profile: DisplayProfile) -> Self {
        self.entries.insert(user.to_string(), profile);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticDirectory {
    async fn profile(&self, user: &UserId) -> Option<DisplayProfile> {
        self.entries.get(user).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_step_by_step() {
        let full = DisplayProfile {
            given_name: Some("Ada".into()),
            family_name: Some("Lovelace".into()),
            contact: Some("ada@example.com".into()),
        };
        assert_eq!(full.display_name(), "Ada Lovelace");

        let given_only = DisplayProfile {
            given_name: Some("Ada".into()),
            ..Default::default()
        };
        assert_eq!(given_only.display_name(), "Ada");

        let contact_only = DisplayProfile {
            contact: Some("ada@example.com".into()),
            ..Default::default()
        };
        assert_eq!(contact_only.display_name(), "ada");

        assert_eq!(DisplayProfile::default().display_name(), "Anonymous Player");
    }

    #[tokio::test]
    async fn static_directory_serves_registered_users_only() {
        let directory = StaticDirectory::new().with(
            "u1",
            DisplayProfile {
                given_name: Some("Ann".into()),
                ..Default::default()
            },
        );
        let hit = directory.profile(&"u1".to_string()).await.unwrap();
        assert_eq!(hit.display_name(), "Ann");
        assert!(directory.profile(&"u2".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn null_identity_knows_nobody() {
        assert!(NullIdentity.profile(&"u1".to_string()).await.is_none());
    }
}
