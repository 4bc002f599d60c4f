pub mod credentials;
pub mod router;
pub mod user;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;
use credentials::AdminUser;
use user::AuthSession;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Any signed-in account.
pub fn require_user(auth_session: &AuthSession) -> Result<&AdminUser, ApiError> {
    auth_session.user.as_ref().ok_or(ApiError::Unauthorized)
}

/// Only accounts with the admin role.
pub fn require_admin(auth_session: &AuthSession) -> Result<&AdminUser, ApiError> {
    let user = require_user(auth_session)?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(ApiError::Forbidden)
    }
}
