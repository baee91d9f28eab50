//! Authentication strategy trait definition.

use async_trait::async_trait;
use russh::client;

use crate::error::Error;
use crate::session::ClientHandler;

/// One SSH authentication method.
///
/// Implementations must be thread-safe (`Send + Sync`). A strategy
/// reports `Ok(true)` when the server accepted it, `Ok(false)` when the
/// server rejected the credential, and `Err` when the attempt itself
/// failed (unreachable agent, unparseable key). The chain treats the
/// latter two the same way: fall through to the next strategy.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<ClientHandler>,
        username: &str,
    ) -> Result<bool, Error>;

    /// Strategy name, for logging.
    fn name(&self) -> &'static str;
}
