//! Atomic file deployment command builder.
//!
//! Deployment is expressed entirely as one composite POSIX-shell command:
//! the content travels gzip-compressed and base64-encoded inside the
//! command string, lands in a temp file under the scratch directory, and
//! is moved onto the destination only once fully written. The temp name
//! embeds the SHA-256 of the uncompressed content, so repeated
//! deployments of identical payloads converge on the same temp path
//! instead of colliding, and a reader of the destination only ever sees
//! the old content or the complete new content.
//!
//! The remote host needs `mkdir`, `base64`, `gunzip`, `tee`, `chown`,
//! `chmod`, `mv`, and passwordless `sudo`.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};

use crate::config::{SCRATCH_DIR, TMP_PREFIX};
use crate::error::Error;

/// Quote one caller-supplied field for safe interpolation into the
/// command. Strings with no shell-significant characters pass through
/// unchanged.
pub(crate) fn escape(field: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(field))
}

/// Lowercase hex SHA-256 of the uncompressed content.
fn content_digest(content: &[u8]) -> String {
    Sha256::digest(content)
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Build the shell command that installs `content` at `path`.
///
/// The pipeline: create the destination's parent directory, decode and
/// decompress the payload into the content-addressed temp path, apply the
/// optional `chown`/`chmod`, then atomically move the temp file onto the
/// destination. `owner` is applied when non-empty; `mode` when greater
/// than zero, rendered octal.
///
/// Pure string construction; the only failure mode is local I/O while
/// compressing the content.
pub fn deploy_command(
    path: &str,
    content: &[u8],
    owner: Option<&str>,
    mode: Option<u32>,
) -> Result<String, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    let compressed = encoder.finish()?;
    let encoded = BASE64.encode(&compressed);

    // The digest covers the uncompressed content: identical payloads get
    // identical temp names no matter how the compressor behaves.
    let tmp_path = format!("{}/{}{}", SCRATCH_DIR, TMP_PREFIX, content_digest(content));

    let dir = match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    };

    let mut cmd = format!(
        "sudo mkdir -p {} && echo {} | base64 -d | gunzip | sudo tee {}",
        escape(&dir),
        encoded,
        tmp_path
    );
    if let Some(owner) = owner.filter(|owner| !owner.is_empty()) {
        cmd.push_str(&format!(" && sudo chown {} {}", escape(owner), tmp_path));
    }
    if let Some(mode) = mode.filter(|mode| *mode > 0) {
        cmd.push_str(&format!(" && sudo chmod {:o} {}", mode, tmp_path));
    }
    cmd.push_str(&format!(" && sudo mv {} {}", tmp_path, escape(path)));

    Ok(cmd)
}
