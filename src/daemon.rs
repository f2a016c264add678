//! The IPC endpoint to the log-shipping daemon (§1, §4.F, §6).
//!
//! The daemon transport itself is an external collaborator; this module
//! defines the wire framing this crate owns (§6) and the `DaemonSink` trait
//! the filter pipeline sends through, plus a recording fake for tests.

use std::io;

/// Frames one serialized record for transmission to the daemon: a ten-digit
/// zero-padded decimal length (not counting the framing itself), a space,
/// the record text with no trailing newline, and a terminating NUL byte.
pub fn frame(record_text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(record_text.len() + 12);
    out.extend_from_slice(format!("{:010}", record_text.len()).as_bytes());
    out.push(b' ');
    out.extend_from_slice(record_text.as_bytes());
    out.push(0);
    out
}

/// The daemon IPC endpoint, abstracted so the retry-on-failure policy in
/// `client::Client::send` is unit-testable against a fake.
pub trait DaemonSink: Send + Sync {
    /// Sends one already-framed blob (§6). Errors indicate the connection
    /// was lost; the caller attempts one `rebind` and retry before giving
    /// up (§4.F, §7).
    fn send(&self, framed: &[u8]) -> io::Result<()>;

    /// Re-establishes the connection after a lost `send`.
    fn rebind(&self) -> io::Result<()>;
}
