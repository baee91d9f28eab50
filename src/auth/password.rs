//! Password-based SSH authentication.

use async_trait::async_trait;
use russh::client;
use zeroize::Zeroizing;

use crate::error::Error;
use crate::session::ClientHandler;

use super::traits::AuthStrategy;

/// Password authentication strategy.
pub struct PasswordAuth {
    password: Zeroizing<String>,
}

impl PasswordAuth {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
        }
    }
}

#[async_trait]
impl AuthStrategy for PasswordAuth {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<ClientHandler>,
        username: &str,
    ) -> Result<bool, Error> {
        let result = handle
            .authenticate_password(username, &*self.password)
            .await?;

        Ok(result.success())
    }

    fn name(&self) -> &'static str {
        "password"
    }
}
