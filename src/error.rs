//! Error taxonomy for connection, execution, and deployment failures.
//!
//! Transport and authentication failures propagate the underlying
//! [`russh::Error`] verbatim; nothing is retried here. A remote process
//! exiting non-zero is the one failure that still carries a fully
//! populated [`CommandResult`], so callers can inspect captured output
//! while matching on the error.

use crate::result::CommandResult;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote process ran to completion but exited non-zero. The
    /// captured output rides along with the status.
    #[error("process exited with status {status}")]
    ExitStatus {
        status: u32,
        result: Box<CommandResult>,
    },

    /// Transport-level failure: dial, channel open, or protocol error.
    #[error(transparent)]
    Ssh(#[from] russh::Error),

    /// Private key material could not be loaded or parsed.
    #[error("invalid private key: {0}")]
    Key(#[from] russh::keys::Error),

    /// The SSH agent was unreachable or misbehaved.
    #[error("agent: {0}")]
    Agent(String),

    /// Every configured authentication method was tried and rejected.
    #[error("authentication failed: no credential was accepted")]
    AuthenticationExhausted,

    /// Local I/O failure while preparing deployment content.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server's host key was rejected by the verification policy.
    #[error("host key verification failed for {host}:{port}")]
    HostKeyUnverified { host: String, port: u16 },

    /// The execution channel died before reporting an exit status.
    #[error("channel closed before reporting an exit status")]
    ChannelClosed,

    /// Operation attempted on a client that has been closed.
    #[error("client is closed")]
    Closed,

    /// The command was cancelled before the remote process exited.
    #[error("command cancelled")]
    Cancelled,
}

impl Error {
    /// The captured result, when this error still carries one.
    ///
    /// Only [`Error::ExitStatus`] yields a result; every other failure
    /// happened before or outside a completed execution.
    pub fn result(&self) -> Option<&CommandResult> {
        match self {
            Error::ExitStatus { result, .. } => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn failed_result(status: u32) -> CommandResult {
        CommandResult::new(
            crate::logging::LogWriter::new(None),
            crate::logging::LogWriter::new(None),
            Duration::from_millis(1),
            status,
        )
    }

    #[test]
    fn test_exit_status_message_references_status() {
        let err = Error::ExitStatus {
            status: 3,
            result: Box::new(failed_result(3)),
        };
        assert_eq!(err.to_string(), "process exited with status 3");
    }

    #[test]
    fn test_exit_status_carries_result() {
        let err = Error::ExitStatus {
            status: 1,
            result: Box::new(failed_result(1)),
        };
        let result = err.result().expect("exit-status error carries a result");
        assert_eq!(result.exit_status(), 1);
        assert!(!result.success());
    }

    #[test]
    fn test_other_errors_carry_no_result() {
        assert!(Error::Closed.result().is_none());
        assert!(Error::ChannelClosed.result().is_none());
        assert!(Error::Cancelled.result().is_none());
    }

    #[test]
    fn test_closed_message() {
        assert_eq!(Error::Closed.to_string(), "client is closed");
    }

    #[test]
    fn test_host_key_message_names_endpoint() {
        let err = Error::HostKeyUnverified {
            host: "example.com".to_string(),
            port: 22,
        };
        assert!(err.to_string().contains("example.com:22"));
    }
}
