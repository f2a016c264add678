//! The change-notification service used to detect when the process and
//! system-master override filters must be reloaded (§4.F, §9's `Notifier`
//! abstraction).
//!
//! The notifier itself — the daemon that actually watches for configuration
//! changes — is an external collaborator (§1); this module defines only the
//! trait the filter pipeline polls and a deterministic fake for tests.

/// A monotonically-advancing value handed out by a [`Notifier`]. Two tokens
/// compare equal only if no watched state changed between when they were
/// obtained.
pub type Token = u64;

/// The external change-notification service.
///
/// `register` names a watched value (e.g. the process-filter or
/// system-master-filter state); `check` reports whether it has changed since
/// `token` was last observed; `get_state` reads the current value.
pub trait Notifier: Send + Sync {
    /// Subscribes to changes in `name`, returning an initial token.
    fn register(&self, name: &str) -> Token;

    /// Reports whether `name`'s value has changed since `token` was
    /// obtained. On `true`, the caller should call `get_state` and then
    /// re-register to get a fresh token.
    fn check(&self, token: Token) -> bool;

    /// Reads the current value associated with a token's name.
    fn get_state(&self, token: Token) -> u64;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A deterministic [`Notifier`] test double: `bump` advances a named
    /// value and invalidates every token issued for it.
    #[derive(Default)]
    pub struct FakeNotifier {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        values: HashMap<String, u64>,
        generations: HashMap<String, u64>,
        tokens: HashMap<Token, (String, u64)>,
        next_token: Token,
    }

    impl FakeNotifier {
        pub fn new() -> FakeNotifier {
            FakeNotifier::default()
        }

        /// Sets `name`'s value and advances its generation, invalidating
        /// every outstanding token registered against it.
        pub fn bump(&self, name: &str, value: u64) {
            let mut inner = self.inner.lock().unwrap();
            inner.values.insert(name.to_string(), value);
            let gen = inner.generations.entry(name.to_string()).or_insert(0);
            *gen += 1;
        }
    }

    impl Notifier for FakeNotifier {
        fn register(&self, name: &str) -> Token {
            let mut inner = self.inner.lock().unwrap();
            let gen = *inner.generations.entry(name.to_string()).or_insert(0);
            let token = inner.next_token;
            inner.next_token += 1;
            inner.tokens.insert(token, (name.to_string(), gen));
            token
        }

        fn check(&self, token: Token) -> bool {
            let inner = self.inner.lock().unwrap();
            match inner.tokens.get(&token) {
                Some((name, gen)) => inner.generations.get(name).copied().unwrap_or(0) != *gen,
                None => false,
            }
        }

        fn get_state(&self, token: Token) -> u64 {
            let inner = self.inner.lock().unwrap();
            match inner.tokens.get(&token) {
                Some((name, _)) => inner.values.get(name).copied().unwrap_or(0),
                None => 0,
            }
        }
    }

    #[test]
    fn fresh_token_reports_unchanged() {
        let n = FakeNotifier::new();
        let t = n.register("process_filter");
        assert!(!n.check(t));
    }

    #[test]
    fn bump_invalidates_outstanding_tokens() {
        let n = FakeNotifier::new();
        let t = n.register("process_filter");
        n.bump("process_filter", 0b0011_1111);
        assert!(n.check(t));
        assert_eq!(n.get_state(t), 0b0011_1111);
    }

    #[test]
    fn unrelated_name_does_not_invalidate() {
        let n = FakeNotifier::new();
        let t = n.register("process_filter");
        n.bump("master_filter", 7);
        assert!(!n.check(t));
    }
}
