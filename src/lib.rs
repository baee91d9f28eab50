//! Async SSH client for remote command execution and file deployment.
//!
//! A [`Client`] owns one lazily-established, cached connection to a remote
//! host. Commands run over that connection with both output streams
//! captured and line-dispatched to injectable log sinks, and file content
//! deploys through a compress/encode/checksum shell pipeline that installs
//! atomically via a content-addressed temp path.
//!
//! This crate is organized into the following modules:
//!
//! - `auth`: ordered authentication strategies (password, agent, keys)
//! - `client`: connection lifecycle and command execution
//! - `config`: defaults and keys-directory resolution
//! - `deploy`: the atomic file deployment command builder
//! - `error`: error taxonomy
//! - `logging`: log sink capability and the line-capturing buffer
//! - `result`: structured command outcome
//! - `session`: transport handler and host-key verification policy
//!
//! # Example
//!
//! ```ignore
//! use gossh::{Client, logging::TracingSink};
//!
//! let mut client = Client::new("10.0.0.5", "deploy");
//! client.set_info_sink(TracingSink::info());
//!
//! let result = client.execute("uname -a").await?;
//! assert!(result.success());
//!
//! client.deploy_file("/etc/app/config", b"hello\n", None, Some(0o644)).await?;
//! client.close().await;
//! ```

pub mod auth;
mod client;
pub(crate) mod config;
pub mod deploy;
mod error;
pub mod logging;
mod result;
pub mod session;

pub use auth::KeySource;
pub use client::Client;
pub use error::Error;
pub use logging::{LogSink, LogWriter};
pub use result::CommandResult;
pub use session::HostKeyPolicy;
