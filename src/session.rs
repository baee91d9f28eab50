//! Transport handler and host-key verification policy.
//!
//! The russh client handler is the hook through which the server's host
//! key reaches us during the handshake. Verification is policy-driven:
//! strict known-hosts checking by default, with an explicit opt-out for
//! environments (test rigs, freshly provisioned fleets) that accept any
//! host identity.

use std::path::PathBuf;

use russh::{client, keys};

use crate::error::Error;

/// How the server's host key is verified during connect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Verify against the user's default known_hosts file. Unknown or
    /// changed keys abort the connection.
    #[default]
    Strict,
    /// Verify against a specific known_hosts file.
    KnownHostsFile(PathBuf),
    /// Accept any host key without verification, like
    /// `StrictHostKeyChecking=no`. Explicit opt-out only.
    AcceptAll,
}

/// Client handler carrying the host-key policy for one connection.
pub(crate) struct ClientHandler {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) policy: HostKeyPolicy,
}

impl client::Handler for ClientHandler {
    type Error = Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.policy {
            HostKeyPolicy::AcceptAll => Ok(true),
            HostKeyPolicy::Strict => {
                keys::check_known_hosts(&self.host, self.port, server_public_key).map_err(|_| {
                    Error::HostKeyUnverified {
                        host: self.host.clone(),
                        port: self.port,
                    }
                })
            }
            HostKeyPolicy::KnownHostsFile(path) => {
                keys::check_known_hosts_path(&self.host, self.port, server_public_key, path)
                    .map_err(|_| Error::HostKeyUnverified {
                        host: self.host.clone(),
                        port: self.port,
                    })
            }
        }
    }
}
