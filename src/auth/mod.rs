//! Authentication strategies for SSH connections.
//!
//! Credentials resolve into an ordered [`AuthChain`] without any network
//! I/O; the chain then runs against the live connection handle during
//! connect. Strategies that cannot produce a usable credential (agent
//! socket missing, key file unreadable) fall through silently to the next
//! one, so a partially configured host degrades instead of failing early.
//!
//! # Available Strategies
//!
//! - [`PasswordAuth`]: password authentication
//! - [`AgentAuth`]: SSH agent identities, tried in agent order
//! - [`KeyAuth`]: an explicitly configured private key (file or inline)
//! - [`DefaultKeyAuth`]: conventional per-user key files, tried in order

mod agent;
mod chain;
mod key;
mod password;
mod traits;

pub use agent::AgentAuth;
pub use chain::AuthChain;
pub use key::{DefaultKeyAuth, KeyAuth, KeySource};
pub use password::PasswordAuth;
pub use traits::AuthStrategy;
