//! Process-wide singleton state (§3, §5): the override-filter cache, the
//! cached default sender, and the daemon-sink handle's reference count.
//!
//! Mirrors the two-mutex split the data model calls for: `state_lock`
//! guards the override cache and cached sender, `daemon_lock` guards the
//! daemon-sink handle. Both are plain `std::sync::Mutex`es behind a
//! `lazy_static!`, the same style used elsewhere in this codebase for a
//! single process-wide counter.

use std::path::Path;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;

use crate::daemon::DaemonSink;
use crate::notifier::{Notifier, Token};

const REFRESH_NAME: &str = "com.apple.asl.filter";
const MASTER_NAME: &str = "com.apple.system.filter.master";
const PROCESS_NAME: &str = "com.apple.system.filter.process";

struct OverrideCache {
    refresh_token: Token,
    master_token: Token,
    process_token: Token,
    process_filter_mask: u32,
    system_master_filter_mask: u32,
}

#[derive(Default)]
struct StateLock {
    override_cache: Option<OverrideCache>,
    cached_sender: Option<String>,
}

#[derive(Default)]
struct DaemonLock {
    handle: Option<Arc<dyn DaemonSink>>,
    refcount: usize,
}

/// The process-wide singleton (§3's "Process-wide state").
pub struct State {
    state_lock: Mutex<StateLock>,
    daemon_lock: Mutex<DaemonLock>,
}

lazy_static! {
    static ref STATE: State = State {
        state_lock: Mutex::new(StateLock::default()),
        daemon_lock: Mutex::new(DaemonLock::default()),
    };
}

/// Accesses the process-wide singleton.
pub fn state() -> &'static State {
    &STATE
}

impl State {
    /// Refreshes the override-filter cache if the notifier reports a
    /// change, then returns `(process_filter_mask, system_master_filter_mask)`.
    /// Serialized under `state_lock` (§4.F, §5).
    pub fn refresh_override_masks(&self, notifier: &dyn Notifier) -> (u32, u32) {
        let mut locked = self.state_lock.lock().unwrap();

        match &mut locked.override_cache {
            None => {
                let refresh_token = notifier.register(REFRESH_NAME);
                let master_token = notifier.register(MASTER_NAME);
                let process_token = notifier.register(PROCESS_NAME);
                let system_master_filter_mask = notifier.get_state(master_token) as u32;
                let process_filter_mask = notifier.get_state(process_token) as u32;
                locked.override_cache = Some(OverrideCache {
                    refresh_token,
                    master_token,
                    process_token,
                    process_filter_mask,
                    system_master_filter_mask,
                });
            }
            Some(cache) => {
                if notifier.check(cache.refresh_token) {
                    cache.system_master_filter_mask = notifier.get_state(cache.master_token) as u32;
                    cache.process_filter_mask = notifier.get_state(cache.process_token) as u32;
                    cache.refresh_token = notifier.register(REFRESH_NAME);
                }
            }
        }

        let cache = locked.override_cache.as_ref().unwrap();
        (cache.process_filter_mask, cache.system_master_filter_mask)
    }

    /// The once-derived default sender name, from argv[0]'s basename, or
    /// `"Unknown"` if it can't be determined (§3's `cached_sender`).
    pub fn cached_sender(&self) -> String {
        let mut locked = self.state_lock.lock().unwrap();
        locked
            .cached_sender
            .get_or_insert_with(|| {
                std::env::args()
                    .next()
                    .map(|arg0| {
                        Path::new(&arg0)
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or(arg0)
                    })
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "Unknown".to_string())
            })
            .clone()
    }

    /// Acquires a reference on the daemon-sink handle, constructing it via
    /// `factory` if this is the first acquisition. Serialized under
    /// `daemon_lock` (§5).
    pub fn acquire_daemon_sink(&self, factory: impl FnOnce() -> Arc<dyn DaemonSink>) -> Arc<dyn DaemonSink> {
        let mut locked = self.daemon_lock.lock().unwrap();
        locked.refcount += 1;
        locked.handle.get_or_insert_with(factory).clone()
    }

    /// Releases a reference acquired via [`State::acquire_daemon_sink`].
    /// When the count reaches zero, this singleton's own `Arc` is dropped;
    /// the daemon-sink handle itself is torn down once every clone (held by
    /// individual clients) has also been dropped.
    pub fn release_daemon_sink(&self) {
        let mut locked = self.daemon_lock.lock().unwrap();
        locked.refcount = locked.refcount.saturating_sub(1);
        if locked.refcount == 0 {
            locked.handle = None;
        }
    }

    /// Resets all process-wide state after a `fork`, to be called from the
    /// child before any other call (§5's `post_fork_child`).
    ///
    /// The spec notes no locks need to be taken here because the child is
    /// single-threaded immediately after `fork`; this implementation still
    /// goes through the ordinary `Mutex::lock` API (uncontended, since no
    /// other thread exists yet) rather than bypassing it with `unsafe`,
    /// which Rust's `Mutex` offers no safe way to do.
    pub fn post_fork_child(&self) {
        *self.state_lock.lock().unwrap() = StateLock::default();
        *self.daemon_lock.lock().unwrap() = DaemonLock::default();
    }
}
