//! Structured outcome of one remote command.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::logging::LogWriter;

/// Captured output, timing, and exit status of one executed command.
///
/// Both output streams are preserved in full even when the command
/// failed; the exit status is meaningful only for commands that actually
/// reported one (transport failures surface as errors instead, with no
/// result at all).
#[derive(Debug)]
pub struct CommandResult {
    stdout: LogWriter,
    stderr: LogWriter,
    runtime: Duration,
    exit_status: u32,
}

/// Summary shape rendered by [`CommandResult`]'s `Display`. Byte counts
/// stand in for the raw streams so results can be logged without dumping
/// potentially large payloads.
#[derive(Serialize)]
struct Summary {
    stdout: String,
    stderr: String,
    runtime: String,
    status: u32,
}

impl CommandResult {
    pub(crate) fn new(
        stdout: LogWriter,
        stderr: LogWriter,
        runtime: Duration,
        exit_status: u32,
    ) -> Self {
        Self {
            stdout,
            stderr,
            runtime,
            exit_status,
        }
    }

    /// Captured standard output as text.
    pub fn stdout(&self) -> String {
        self.stdout.as_text()
    }

    /// Captured standard error as text.
    pub fn stderr(&self) -> String {
        self.stderr.as_text()
    }

    /// Wall-clock runtime of the command.
    pub fn runtime(&self) -> Duration {
        self.runtime
    }

    /// Remote exit status; zero means success.
    pub fn exit_status(&self) -> u32 {
        self.exit_status
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = Summary {
            stdout: format!("{} bytes", self.stdout.len()),
            stderr: format!("{} bytes", self.stderr.len()),
            runtime: format!("{:.6}", self.runtime.as_secs_f64()),
            status: self.exit_status,
        };
        match serde_json::to_string(&summary) {
            Ok(rendered) => f.write_str(&rendered),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(stdout: &[u8], stderr: &[u8], millis: u64, status: u32) -> CommandResult {
        let mut out = LogWriter::new(None);
        out.write(stdout);
        let mut err = LogWriter::new(None);
        err.write(stderr);
        CommandResult::new(out, err, Duration::from_millis(millis), status)
    }

    #[test]
    fn test_success_is_zero_status() {
        assert!(result_with(b"", b"", 1, 0).success());
        assert!(!result_with(b"", b"", 1, 1).success());
        assert!(!result_with(b"", b"", 1, 127).success());
    }

    #[test]
    fn test_output_accessors() {
        let result = result_with(b"out\n", b"err\n", 1, 0);
        assert_eq!(result.stdout(), "out\n");
        assert_eq!(result.stderr(), "err\n");
    }

    mod summary {
        use super::*;

        #[test]
        fn test_renders_byte_counts_not_payload() {
            let result = result_with(b"hello world\n", b"oops\n", 250, 0);
            let rendered = result.to_string();
            assert!(rendered.contains("\"stdout\":\"12 bytes\""));
            assert!(rendered.contains("\"stderr\":\"5 bytes\""));
            assert!(!rendered.contains("hello world"));
        }

        #[test]
        fn test_renders_six_decimal_runtime() {
            let result = result_with(b"", b"", 250, 0);
            assert!(result.to_string().contains("\"runtime\":\"0.250000\""));
        }

        #[test]
        fn test_renders_numeric_status() {
            let result = result_with(b"", b"", 1, 42);
            assert!(result.to_string().contains("\"status\":42"));
        }
    }
}
