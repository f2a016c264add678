//! A client library for a structured, attribute-based system logging
//! service in the tradition of Apple System Log: records are ordered sets
//! of key/value attributes rather than flat text lines, queries over those
//! records use the same attribute/operator vocabulary as the records
//! themselves, and a severity-mask filter pipeline (with a process-wide
//! override a system operator can dial up without restarting anything)
//! decides what actually leaves the process.
//!
//! # Example
//!
//! ```
//! use asl_client::{builder, client::{Client, ClientOptions}, level::Level};
//! use asl_client::notifier::Notifier;
//!
//! struct NoOverride;
//! impl Notifier for NoOverride {
//!     fn register(&self, _name: &str) -> u64 { 0 }
//!     fn check(&self, _token: u64) -> bool { false }
//!     fn get_state(&self, _token: u64) -> u64 { 0 }
//! }
//!
//! // `NO_REMOTE` skips the daemon sink entirely, so no factory is needed.
//! let mut client = Client::open(
//!     Some("example-app"),
//!     Some("user"),
//!     ClientOptions::NO_REMOTE,
//!     || unreachable!(),
//! );
//!
//! let mut msg = builder::new_message();
//! msg.set(b"Message", Some(b"hello from the example")).unwrap();
//! let status = client.send(msg, Level::Notice, &NoOverride);
//! assert!(status.is_ok());
//! ```
//!
//! # Concurrency
//!
//! The daemon-sink handle and the cached override-filter state are
//! process-wide, guarded by the two mutexes in [`global::State`]. Multiple
//! [`client::Client`]s may be opened and used from different threads without
//! additional synchronization; see [`global`] for the details of what's
//! shared and how.
//!
//! After calling `fork`, a child process that intends to keep logging
//! should call [`global::State::post_fork_child`] before doing anything
//! else, to discard inherited daemon-connection and override-cache state
//! that belongs to the parent.

#![warn(missing_docs)]

pub mod builder;
pub mod client;
pub mod codec;
pub mod daemon;
pub mod error;
pub mod facility;
pub mod format;
pub mod global;
pub mod level;
pub mod matcher;
pub mod notifier;
pub mod op;
pub mod record;
pub mod time;

pub use client::{Client, ClientOptions};
pub use error::AslError;
pub use facility::Facility;
pub use level::Level;
pub use record::Record;

#[cfg(test)]
mod tests;
