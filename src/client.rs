//! SSH client connection and command execution.
//!
//! This module handles the connection lifecycle and per-command channels:
//!
//! 1. **Connection Establishment**: the first operation that needs the
//!    remote host dials it, authenticates through the credential chain,
//!    and caches the handle. Later operations reuse the cached handle; a
//!    client never silently reconnects mid-command.
//!
//! 2. **Authentication**: an ordered chain — password (when set), SSH
//!    agent, then the explicit or default private key — with silent
//!    fallthrough between methods.
//!
//! 3. **Command Execution**: one session channel per command. Output is
//!    captured in full and line-dispatched to the injected sinks while
//!    the command runs; the outcome is classified into a structured
//!    result with the exit status normalized into a descriptive error
//!    when non-zero.
//!
//! Connection state is explicit: `Unconnected` -> `Connected` -> `Closed`,
//! and every operation pattern-matches on it. `Closed` is terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use russh::{ChannelMsg, client};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use zeroize::Zeroizing;

use crate::auth::{AuthChain, AuthStrategy, KeySource};
use crate::config;
use crate::deploy;
use crate::error::Error;
use crate::logging::{LogSink, LogWriter};
use crate::result::CommandResult;
use crate::session::{ClientHandler, HostKeyPolicy};

/// An authenticated transport to one remote host. Owned exclusively by
/// the client that dialed it; dropped on close.
struct Connection {
    handle: client::Handle<ClientHandler>,
}

enum ConnectionState {
    Unconnected,
    Connected(Connection),
    Closed,
}

/// SSH client bound to one remote host.
///
/// Long-lived: the connection is established lazily on first use and
/// cached until [`close`](Client::close). The three log sinks are
/// independent; any subset may be attached. One in-flight command at a
/// time — `execute` takes `&mut self` and blocks until the remote
/// process exits.
pub struct Client {
    host: String,
    user: String,
    port: Option<u16>,
    password: Option<Zeroizing<String>>,
    key: Option<KeySource>,
    keys_dir: Option<PathBuf>,
    host_key_policy: HostKeyPolicy,
    state: ConnectionState,
    debug_sink: Option<Arc<dyn LogSink>>,
    info_sink: Option<Arc<dyn LogSink>>,
    error_sink: Option<Arc<dyn LogSink>>,
}

impl Client {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            port: None,
            password: None,
            key: None,
            keys_dir: None,
            host_key_policy: HostKeyPolicy::default(),
            state: ConnectionState::Unconnected,
            debug_sink: None,
            info_sink: None,
            error_sink: None,
        }
    }

    /// Override the SSH port (22 when unset).
    pub fn set_port(&mut self, port: u16) {
        self.port = Some(port);
    }

    /// Enable password authentication, tried before any key method.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(Zeroizing::new(password.into()));
    }

    /// Configure an explicit private key, replacing the default-key scan.
    pub fn set_private_key(&mut self, source: KeySource) {
        self.key = Some(source);
    }

    /// Override the directory scanned for default private keys
    /// (`~/.ssh` when unset).
    pub fn set_keys_dir(&mut self, dir: impl Into<PathBuf>) {
        self.keys_dir = Some(dir.into());
    }

    /// Set the host-key verification policy (strict by default).
    pub fn set_host_key_policy(&mut self, policy: HostKeyPolicy) {
        self.host_key_policy = policy;
    }

    /// Sink for remote stdout lines.
    pub fn set_debug_sink(&mut self, sink: impl LogSink + 'static) {
        self.debug_sink = Some(Arc::new(sink));
    }

    /// Sink for command lifecycle lines (announcement and timing).
    pub fn set_info_sink(&mut self, sink: impl LogSink + 'static) {
        self.info_sink = Some(Arc::new(sink));
    }

    /// Sink for remote stderr lines.
    pub fn set_error_sink(&mut self, sink: impl LogSink + 'static) {
        self.error_sink = Some(Arc::new(sink));
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    pub(crate) fn effective_port(&self) -> u16 {
        self.port.unwrap_or(config::DEFAULT_PORT)
    }

    fn info(&self, line: &str) {
        if let Some(sink) = &self.info_sink {
            sink.emit(line);
        }
    }

    /// Resolve the configured credentials into an ordered chain.
    ///
    /// Pure construction, no network or file I/O: password first when
    /// set, then the agent, then the explicit key when configured or the
    /// default per-user keys otherwise.
    pub(crate) fn credential_chain(&self) -> AuthChain {
        let mut chain = AuthChain::new();
        if let Some(password) = &self.password {
            chain = chain.with_password((**password).clone());
        }
        chain = chain.with_agent();
        match &self.key {
            Some(source) => chain.with_key(source.clone()),
            None => chain.with_default_keys(config::resolve_keys_dir(self.keys_dir.as_ref())),
        }
    }

    /// Dial and authenticate, storing the handle on success.
    ///
    /// On failure the state stays `Unconnected` and the caller may retry;
    /// no retry happens internally.
    pub async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.state, ConnectionState::Closed) {
            return Err(Error::Closed);
        }

        let port = self.effective_port();
        let ssh_config = Arc::new(client::Config {
            // The cached connection lives until close(); keepalives hold
            // it open rather than an inactivity timeout tearing it down.
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        });
        let handler = ClientHandler {
            host: self.host.clone(),
            port,
            policy: self.host_key_policy.clone(),
        };

        debug!(host = %self.host, port, user = %self.user, "connecting");
        let mut handle = client::connect(ssh_config, (self.host.as_str(), port), handler).await?;

        let chain = self.credential_chain();
        if !chain.authenticate(&mut handle, &self.user).await? {
            return Err(Error::AuthenticationExhausted);
        }

        debug!(host = %self.host, "connection established");
        self.state = ConnectionState::Connected(Connection { handle });
        Ok(())
    }

    /// Connect only when no cached connection exists.
    pub async fn connect_if_absent(&mut self) -> Result<(), Error> {
        match &self.state {
            ConnectionState::Connected(_) => return Ok(()),
            ConnectionState::Closed => return Err(Error::Closed),
            ConnectionState::Unconnected => {}
        }
        self.connect().await
    }

    /// Disconnect and retire the client. Idempotent; safe when no
    /// connection was ever established.
    pub async fn close(&mut self) {
        if let ConnectionState::Connected(conn) = &self.state {
            let _ = conn
                .handle
                .disconnect(russh::Disconnect::ByApplication, "", "")
                .await;
        }
        self.state = ConnectionState::Closed;
    }

    /// Run one command to completion on the remote host.
    ///
    /// Stdout lines stream to the debug sink and stderr lines to the
    /// error sink while the command runs; both streams are captured in
    /// full either way. A non-zero exit becomes
    /// [`Error::ExitStatus`] carrying the populated result.
    pub async fn execute(&mut self, command: &str) -> Result<CommandResult, Error> {
        let started = Instant::now();
        self.connect_if_absent().await?;
        let ConnectionState::Connected(conn) = &self.state else {
            return Err(Error::Closed);
        };

        let mut channel = conn.handle.channel_open_session().await?;
        let mut stdout = LogWriter::new(self.debug_sink.clone());
        let mut stderr = LogWriter::new(self.error_sink.clone());

        self.info(&format!("[EXEC  ] {}", command));
        channel.exec(true, command).await?;

        let exit_status = drain_channel(&mut channel, &mut stdout, &mut stderr).await;

        self.info(&format!("=> {:.6}", started.elapsed().as_secs_f64()));
        let _ = channel.close().await;

        classify(stdout, stderr, started.elapsed(), exit_status)
    }

    /// [`execute`](Client::execute) with cooperative cancellation.
    ///
    /// Cancelling closes the channel and returns [`Error::Cancelled`];
    /// the contract is otherwise identical.
    pub async fn execute_with_cancel(
        &mut self,
        command: &str,
        cancel: CancellationToken,
    ) -> Result<CommandResult, Error> {
        let started = Instant::now();
        self.connect_if_absent().await?;
        let ConnectionState::Connected(conn) = &self.state else {
            return Err(Error::Closed);
        };

        let mut channel = conn.handle.channel_open_session().await?;
        let mut stdout = LogWriter::new(self.debug_sink.clone());
        let mut stderr = LogWriter::new(self.error_sink.clone());

        self.info(&format!("[EXEC  ] {}", command));
        channel.exec(true, command).await?;

        let outcome = tokio::select! {
            biased;

            _ = cancel.cancelled() => None,

            exit_status = drain_channel(&mut channel, &mut stdout, &mut stderr) => {
                Some(exit_status)
            }
        };

        self.info(&format!("=> {:.6}", started.elapsed().as_secs_f64()));
        let _ = channel.close().await;

        match outcome {
            None => Err(Error::Cancelled),
            Some(exit_status) => classify(stdout, stderr, started.elapsed(), exit_status),
        }
    }

    /// Open a raw byte stream to `host:port` through the connection.
    ///
    /// This is the tunneling capability other protocol clients build on:
    /// anything speaking TCP can be pointed at the returned stream
    /// without this crate knowing about the protocol.
    pub async fn dial(
        &mut self,
        host: &str,
        port: u16,
    ) -> Result<russh::ChannelStream<client::Msg>, Error> {
        self.connect_if_absent().await?;
        let ConnectionState::Connected(conn) = &self.state else {
            return Err(Error::Closed);
        };

        let channel = conn
            .handle
            .channel_open_direct_tcpip(host, port as u32, "127.0.0.1", 0)
            .await?;
        Ok(channel.into_stream())
    }

    /// Deploy `content` to `path` on the remote host.
    ///
    /// Composes the atomic install pipeline from
    /// [`deploy::deploy_command`] and runs it like any other command.
    pub async fn deploy_file(
        &mut self,
        path: &str,
        content: &[u8],
        owner: Option<&str>,
        mode: Option<u32>,
    ) -> Result<CommandResult, Error> {
        let command = deploy::deploy_command(path, content, owner, mode)?;
        self.execute(&command).await
    }
}

/// Pump channel messages into the output writers until the channel ends.
///
/// Returns the reported exit status, or `None` when the channel died
/// without reporting one.
async fn drain_channel(
    channel: &mut russh::Channel<client::Msg>,
    stdout: &mut LogWriter,
    stderr: &mut LogWriter,
) -> Option<u32> {
    let mut exit_status = None;

    loop {
        match channel.wait().await {
            Some(ChannelMsg::Data { data }) => {
                stdout.write(&data);
            }
            Some(ChannelMsg::ExtendedData { data, ext }) => {
                // ext == 1 is stderr in the SSH protocol
                if ext == 1 {
                    stderr.write(&data);
                }
            }
            Some(ChannelMsg::ExitStatus { exit_status: status }) => {
                exit_status = Some(status);
            }
            Some(ChannelMsg::Eof) => {
                // Keep waiting for the exit status if it has not arrived
                if exit_status.is_some() {
                    break;
                }
            }
            Some(ChannelMsg::Close) => break,
            Some(_) => {}
            None => break,
        }
    }

    exit_status
}

/// Classify a completed run into a result or a normalized error.
fn classify(
    stdout: LogWriter,
    stderr: LogWriter,
    runtime: Duration,
    exit_status: Option<u32>,
) -> Result<CommandResult, Error> {
    let status = exit_status.ok_or(Error::ChannelClosed)?;
    let result = CommandResult::new(stdout, stderr, runtime, status);
    if result.success() {
        Ok(result)
    } else {
        Err(Error::ExitStatus {
            status,
            result: Box::new(result),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod credential_resolution {
        use super::*;

        #[test]
        fn test_password_resolves_first() {
            let mut client = Client::new("example.com", "deploy");
            client.set_password("secret");

            let chain = client.credential_chain();
            assert_eq!(
                chain.strategy_names(),
                vec!["password", "agent", "default-key"]
            );
        }

        #[test]
        fn test_no_password_starts_with_agent() {
            let client = Client::new("example.com", "deploy");
            let chain = client.credential_chain();
            assert_eq!(chain.strategy_names(), vec!["agent", "default-key"]);
        }

        #[test]
        fn test_explicit_key_replaces_default_scan() {
            let mut client = Client::new("example.com", "deploy");
            client.set_private_key(KeySource::file("/etc/keys/deploy_ed25519"));

            let chain = client.credential_chain();
            assert_eq!(chain.strategy_names(), vec!["agent", "key"]);
        }

        #[test]
        fn test_resolution_is_pure() {
            // Building the chain twice must not consume or mutate config.
            let mut client = Client::new("example.com", "deploy");
            client.set_password("secret");

            let first = client.credential_chain().strategy_names();
            let second = client.credential_chain().strategy_names();
            assert_eq!(first, second);
        }
    }

    mod connection_state {
        use super::*;

        #[test]
        fn test_new_client_is_unconnected() {
            let client = Client::new("example.com", "deploy");
            assert!(!client.is_connected());
        }

        #[test]
        fn test_port_defaults_to_22() {
            let client = Client::new("example.com", "deploy");
            assert_eq!(client.effective_port(), 22);
        }

        #[test]
        fn test_port_override() {
            let mut client = Client::new("example.com", "deploy");
            client.set_port(2222);
            assert_eq!(client.effective_port(), 2222);
        }

        #[tokio::test]
        async fn test_close_is_idempotent() {
            let mut client = Client::new("example.com", "deploy");
            client.close().await;
            client.close().await;
            assert!(!client.is_connected());
        }

        #[tokio::test]
        async fn test_execute_after_close_is_rejected() {
            let mut client = Client::new("example.com", "deploy");
            client.close().await;

            let err = client.execute("true").await.unwrap_err();
            assert!(matches!(err, Error::Closed));
        }

        #[tokio::test]
        async fn test_connect_if_absent_after_close_is_rejected() {
            let mut client = Client::new("example.com", "deploy");
            client.close().await;

            assert!(matches!(
                client.connect_if_absent().await.unwrap_err(),
                Error::Closed
            ));
        }

        #[tokio::test]
        async fn test_dial_after_close_is_rejected() {
            let mut client = Client::new("example.com", "deploy");
            client.close().await;

            let err = match client.dial("127.0.0.1", 80).await {
                Ok(_) => panic!("expected dial after close to be rejected"),
                Err(e) => e,
            };
            assert!(matches!(err, Error::Closed));
        }

        #[tokio::test]
        async fn test_deploy_after_close_is_rejected() {
            let mut client = Client::new("example.com", "deploy");
            client.close().await;

            let err = client
                .deploy_file("/etc/app/config", b"hello\n", None, Some(0o644))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Closed));
        }
    }

    mod classification {
        use super::*;

        fn writers() -> (LogWriter, LogWriter) {
            (LogWriter::new(None), LogWriter::new(None))
        }

        #[test]
        fn test_zero_status_is_ok() {
            let (out, err) = writers();
            let result = classify(out, err, Duration::from_millis(5), Some(0)).unwrap();
            assert!(result.success());
            assert_eq!(result.exit_status(), 0);
        }

        #[test]
        fn test_nonzero_status_is_normalized_error() {
            let (mut out, err) = writers();
            out.write(b"partial output\n");

            let error = classify(out, err, Duration::from_millis(5), Some(2)).unwrap_err();
            assert!(error.to_string().contains("status 2"));

            // Captured output survives inside the error.
            let result = error.result().expect("populated result");
            assert_eq!(result.stdout(), "partial output\n");
            assert_eq!(result.exit_status(), 2);
        }

        #[test]
        fn test_missing_status_is_transport_error() {
            let (out, err) = writers();
            let error = classify(out, err, Duration::from_millis(5), None).unwrap_err();
            assert!(matches!(error, Error::ChannelClosed));
            assert!(error.result().is_none());
        }
    }
}
