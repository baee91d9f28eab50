//! SSH agent authentication.

use async_trait::async_trait;
use russh::{client, keys};
use tracing::debug;

use crate::error::Error;
use crate::session::ClientHandler;

use super::traits::AuthStrategy;

/// SSH agent authentication strategy.
///
/// Connects to the agent named by `SSH_AUTH_SOCK` and tries each identity
/// it offers until one is accepted. An unreachable or empty agent is an
/// error the chain falls through on, never a hard failure.
pub struct AgentAuth;

impl AgentAuth {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AgentAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthStrategy for AgentAuth {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<ClientHandler>,
        username: &str,
    ) -> Result<bool, Error> {
        let mut agent = keys::agent::client::AgentClient::connect_env()
            .await
            .map_err(|e| Error::Agent(format!("failed to connect: {}", e)))?;

        let identities = agent
            .request_identities()
            .await
            .map_err(|e| Error::Agent(format!("failed to list identities: {}", e)))?;

        if identities.is_empty() {
            return Err(Error::Agent("no identities offered".to_string()));
        }

        for identity in identities {
            debug!("trying agent identity: {:?}", identity.comment());

            // For RSA keys, use the best hash algorithm the server supports
            let hash_alg = handle
                .best_supported_rsa_hash()
                .await
                .ok()
                .flatten()
                .flatten();

            match handle
                .authenticate_publickey_with(username, identity.clone(), hash_alg, &mut agent)
                .await
            {
                Ok(result) if result.success() => {
                    debug!("agent identity accepted");
                    return Ok(true);
                }
                Ok(_) => {
                    debug!("agent identity not accepted, trying next");
                    continue;
                }
                Err(e) => {
                    debug!("agent identity errored ({}), trying next", e);
                    continue;
                }
            }
        }

        Ok(false)
    }

    fn name(&self) -> &'static str {
        "agent"
    }
}
