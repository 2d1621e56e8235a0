use serde::{Deserialize, Serialize};

/// Role claim an identity may carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

/// The verified claims of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable subject identifier.
    pub subject: String,
    pub email: String,
    /// Present only for administrators.
    pub role: Option<Role>,
}

impl IdentityClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl IdentityClaims {
        pub fn example_voter() -> Self {
            Self {
                subject: "subject-1234".to_string(),
                email: "voter@example.com".to_string(),
                role: None,
            }
        }

        pub fn example_admin() -> Self {
            Self {
                subject: "subject-admin".to_string(),
                email: "admin@example.com".to_string(),
                role: Some(Role::Admin),
            }
        }
    }
}
