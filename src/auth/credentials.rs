//! Who may sign in, and with which role.
//!
//! Credentials are compared in plaintext against a fixed list. This is not a
//! hardened security boundary: anything beyond a single-event deployment
//! should plug a hashed, persistent store in behind [`CredentialProvider`].

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can see the dashboard.
    Admin,
    /// Can sign in and check attendees in.
    Organizer,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub email: String,
    password: String,
    pub role: Role,
}

impl AdminUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for AdminUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

pub trait CredentialProvider: fmt::Debug + Send + Sync {
    /// Email matches case-insensitively, password exactly. A wrong email and
    /// a wrong password are indistinguishable.
    fn validate(&self, email: &str, password: &str) -> Option<AdminUser>;

    /// The account behind a stored session identity, if it still exists.
    fn lookup(&self, email: &str) -> Option<AdminUser>;
}

/// Re-checks a session's identity against the provider and returns the
/// current account. A revoked account stops authenticating on its next
/// request.
pub fn session_still_valid(provider: &dyn CredentialProvider, email: &str) -> Option<AdminUser> {
    provider.lookup(email)
}

#[derive(Debug, Clone)]
pub struct StaticCredentials {
    users: Vec<AdminUser>,
}

impl StaticCredentials {
    pub fn new(users: Vec<AdminUser>) -> Self {
        Self { users }
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::new(vec![
            AdminUser::new("admin@maranatha.com", "admin123", Role::Admin),
            AdminUser::new("organizador@maranatha.com", "org2024", Role::Organizer),
        ])
    }
}

impl CredentialProvider for StaticCredentials {
    fn validate(&self, email: &str, password: &str) -> Option<AdminUser> {
        self.users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email) && user.password == password)
            .cloned()
    }

    fn lookup(&self, email: &str) -> Option<AdminUser> {
        self.users.iter().find(|user| user.email == email).cloned()
    }
}
