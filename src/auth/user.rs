use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use serde::Deserialize;
use tracing::debug;

use super::credentials::{AdminUser, CredentialProvider, session_still_valid};

impl AuthUser for AdminUser {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.email.clone()
    }

    // A password change logs existing sessions out.
    fn session_auth_hash(&self) -> &[u8] {
        self.password().as_bytes()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Backend {
    credentials: Arc<dyn CredentialProvider>,
}

impl Backend {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = AdminUser;
    type Credentials = Credentials;
    type Error = Infallible;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let user = self.credentials.validate(&creds.email, &creds.password);
        if user.is_none() {
            debug!("No account matches the submitted credentials");
        }
        Ok(user)
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        let user = session_still_valid(self.credentials.as_ref(), user_id);
        if user.is_none() {
            debug!("Session refers to an account that no longer exists");
        }
        Ok(user)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;
