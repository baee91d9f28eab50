//! Defaults and path resolution.
//!
//! The only ambient inputs this crate consumes are the agent socket path
//! (read from `SSH_AUTH_SOCK` by the russh agent client itself) and the
//! home directory used to locate default private keys.

use std::path::PathBuf;

/// Default SSH port when the caller leaves it unset
pub(crate) const DEFAULT_PORT: u16 = 22;

/// Remote scratch directory for deployment temp files
pub(crate) const SCRATCH_DIR: &str = "/tmp";

/// Prefix for content-addressed deployment temp names
pub(crate) const TMP_PREFIX: &str = "gossh.";

/// Conventional private key file names, tried in order
pub(crate) const DEFAULT_KEY_NAMES: &[&str] = &["id_ed25519", "id_rsa", "id_ecdsa"];

/// Resolve the directory holding the user's private keys with priority:
/// explicit override -> `$HOME/.ssh` -> `./.ssh`
pub(crate) fn resolve_keys_dir(override_dir: Option<&PathBuf>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.clone();
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ssh")
}
