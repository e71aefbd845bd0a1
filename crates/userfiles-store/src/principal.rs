//! Resolved user identity

/// A user's credential and roles as read from their record.
///
/// Principals are never mutated after construction. Roles keep the order
/// and duplicates of the source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    password: String,
    roles: Vec<String>,
    email: Option<String>,
}

impl Principal {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        roles: Vec<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles,
            email,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The stored credential, verbatim
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
