//! Error types returned by the record store, filter pipeline, and sink
//! fan-out.

use std::fmt::{self, Display};
use std::io;
use std::os::unix::io::RawFd;

use thiserror::Error;

/// A record mutation was given data that can't be stored: a NUL byte where
/// one is forbidden, or a `Level` value outside the accepted grammar.
///
/// This is distinct from a textual-codec parse failure: decoding malformed
/// canonical text yields `Ok(None)` rather than an error (the record was
/// never successfully parsed, so there is nothing to reject), while these
/// variants come from mutating an already-parsed, in-memory record through
/// `set`/`set_query`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InputShapeError {
    #[error("key contains a NUL byte")]
    NulByteInKey,
    #[error("value contains a NUL byte")]
    NulByteInValue,
    #[error("{0:?} is not a valid Level value")]
    InvalidLevel(String),
}

/// The daemon sink could not accept a message after one rebind-and-retry.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("no daemon sink is connected")]
    NotConnected,
    #[error("daemon send failed: {0}")]
    Send(#[source] io::Error),
}

/// The top-level error type for operations that can fail outside of
/// textual-codec parsing (which reports failure by returning `None`, not
/// by way of this type).
#[derive(Debug, Error)]
pub enum AslError {
    #[error(transparent)]
    InputShape(#[from] InputShapeError),

    /// A local sink's file descriptor could not be written to.
    #[error("sink write failed: {0}")]
    Resource(#[source] io::Error),

    /// The process-wide default client could not be constructed.
    #[error("default client construction failed")]
    Configuration,

    #[error(transparent)]
    Daemon(#[from] DaemonError),
}

/// The outcome of one `Client::send`: the daemon-sink result and each local
/// sink's result, kept separate so a caller can tell which wrote and which
/// didn't.
///
/// [`SendStatus::is_ok`] reproduces a long-standing quirk of the source
/// this crate is modeled on: the aggregate status is reset to success
/// immediately after the daemon-send attempt, regardless of whether that
/// attempt succeeded, so a daemon failure never by itself flips the
/// returned status to failure. A local sink write failure still does.
#[derive(Debug)]
pub struct SendStatus {
    pub daemon: Option<Result<(), DaemonError>>,
    pub sinks: Vec<(RawFd, Result<(), io::Error>)>,
}

impl SendStatus {
    pub fn new() -> SendStatus {
        SendStatus { daemon: None, sinks: Vec::new() }
    }

    /// `true` unless at least one local sink failed to write. A daemon-sink
    /// failure alone does not make this `false`.
    pub fn is_ok(&self) -> bool {
        self.sinks.iter().all(|(_, r)| r.is_ok())
    }
}

impl Default for SendStatus {
    fn default() -> Self {
        SendStatus::new()
    }
}

impl Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SendStatus {{ ok: {} }}", self.is_ok())
    }
}
