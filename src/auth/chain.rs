//! Ordered authentication chain with silent fallthrough.

use std::path::PathBuf;

use async_trait::async_trait;
use russh::client;
use tracing::debug;

use crate::error::Error;
use crate::session::ClientHandler;

use super::key::KeySource;
use super::traits::AuthStrategy;
use super::{AgentAuth, DefaultKeyAuth, KeyAuth, PasswordAuth};

/// Authentication chain that tries multiple strategies in order.
///
/// The first strategy the server accepts wins. A strategy that fails to
/// produce a credential at all (agent unreachable, key unreadable) is
/// logged and skipped; only when every strategy has been exhausted does
/// the chain surface the last underlying error.
///
/// # Example
///
/// ```ignore
/// let chain = AuthChain::new()
///     .with_password("secret")
///     .with_agent()
///     .with_key(KeySource::file("/path/to/key"));
///
/// chain.authenticate(&mut handle, "username").await?;
/// ```
pub struct AuthChain {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl AuthChain {
    /// Create a new empty authentication chain.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Add password authentication to the chain.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.strategies.push(Box::new(PasswordAuth::new(password)));
        self
    }

    /// Add SSH agent authentication to the chain.
    pub fn with_agent(mut self) -> Self {
        self.strategies.push(Box::new(AgentAuth::new()));
        self
    }

    /// Add an explicitly configured private key to the chain.
    pub fn with_key(mut self, source: KeySource) -> Self {
        self.strategies.push(Box::new(KeyAuth::new(source)));
        self
    }

    /// Add the conventional per-user key files to the chain.
    pub fn with_default_keys(mut self, keys_dir: impl Into<PathBuf>) -> Self {
        self.strategies.push(Box::new(DefaultKeyAuth::new(keys_dir)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl Default for AuthChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthStrategy for AuthChain {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<ClientHandler>,
        username: &str,
    ) -> Result<bool, Error> {
        let mut last_error = None;

        for strategy in &self.strategies {
            debug!("trying authentication strategy: {}", strategy.name());

            match strategy.authenticate(handle, username).await {
                Ok(true) => {
                    debug!("authenticated via {}", strategy.name());
                    return Ok(true);
                }
                Ok(false) => {
                    debug!("strategy {} rejected by server", strategy.name());
                }
                Err(e) => {
                    debug!("strategy {} unusable: {}", strategy.name(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Err(Error::AuthenticationExhausted),
        }
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
