//! Redirect loop guard
//!
//! Caps automatic redirects to `max_attempts` within a rolling window so a
//! server or another script that re-adds tracking parameters cannot bounce
//! the page forever.
//!
//! The counters live in the host store and survive navigations:
//!
//! ```text
//!            permit (count+1)           permit (count+1 == max)
//!   Clear ──────────────────▶ Counting ─────────────────────▶ Blocked
//!     ▲                          │                               │
//!     └──────────────────────────┴───────────────────────────────┘
//!                  now - last_redirect_ms > window_ms
//! ```
//!
//! [`attempt_redirect`] is the pure transition. [`RedirectGuard`] wraps it
//! with persistence and fails open when the store misbehaves.

use serde::Serialize;

use crate::clock::Clock;
use crate::config::{DEFAULT_MAX_REDIRECT_ATTEMPTS, DEFAULT_REDIRECT_WINDOW_MS};
use crate::navigator::{navigate, NavigationError, Navigator};
use crate::store::{get_u64, KvStore, StorageKeys, StoreError};
use crate::types::RedirectMethod;

// =============================================================================
// State Machine
// =============================================================================

/// Guard limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardPolicy {
    pub max_attempts: u32,
    pub window_ms: u64,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_REDIRECT_ATTEMPTS,
            window_ms: DEFAULT_REDIRECT_WINDOW_MS,
        }
    }
}

/// Persisted redirect counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectState {
    pub last_redirect_ms: u64,
    pub count: u32,
}

/// Where the guard stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuardStatus {
    Clear,
    Counting,
    Blocked,
}

/// Decision for one redirect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RedirectOutcome {
    /// Allowed; `count` is the new counter value
    Permitted { count: u32 },
    /// Refused; `count` redirects already happened inside the window
    Refused { count: u32 },
}

impl RedirectOutcome {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted { .. })
    }
}

impl RedirectState {
    /// Apply the window timeout. Clock skew backwards never resets.
    pub fn expire(self, now_ms: u64, policy: &GuardPolicy) -> Self {
        if now_ms.saturating_sub(self.last_redirect_ms) > policy.window_ms {
            Self::default()
        } else {
            self
        }
    }

    pub fn status(&self, now_ms: u64, policy: &GuardPolicy) -> GuardStatus {
        let current = self.expire(now_ms, policy);
        if current.count == 0 {
            GuardStatus::Clear
        } else if current.count < policy.max_attempts {
            GuardStatus::Counting
        } else {
            GuardStatus::Blocked
        }
    }
}

/// Decide whether a redirect may happen at `now_ms`.
///
/// Returns the state to persist and the decision. A refusal leaves the
/// counters untouched (apart from any timeout reset).
pub fn attempt_redirect(state: RedirectState, now_ms: u64, policy: &GuardPolicy) -> (RedirectState, RedirectOutcome) {
    let state = state.expire(now_ms, policy);

    if state.count >= policy.max_attempts {
        return (state, RedirectOutcome::Refused { count: state.count });
    }

    let count = state.count + 1;
    (
        RedirectState {
            last_redirect_ms: now_ms,
            count,
        },
        RedirectOutcome::Permitted { count },
    )
}

// =============================================================================
// Persisted Guard
// =============================================================================

/// Error type for a guarded redirect.
#[derive(Debug, thiserror::Error)]
pub enum RedirectError {
    #[error("Maximum redirect attempts reached ({count}/{max})")]
    Refused { count: u32, max: u32 },
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Redirect guard bound to a store and clock.
pub struct RedirectGuard<'a, S: KvStore + ?Sized, C: Clock + ?Sized> {
    store: &'a mut S,
    clock: &'a C,
    keys: &'a StorageKeys,
    policy: GuardPolicy,
}

impl<'a, S: KvStore + ?Sized, C: Clock + ?Sized> RedirectGuard<'a, S, C> {
    pub fn new(store: &'a mut S, clock: &'a C, keys: &'a StorageKeys, policy: GuardPolicy) -> Self {
        Self {
            store,
            clock,
            keys,
            policy,
        }
    }

    /// Read the persisted counters.
    pub fn load_state(&self) -> Result<RedirectState, StoreError> {
        let last_redirect_ms = get_u64(&*self.store, &self.keys.last_redirect)?;
        let count = get_u64(&*self.store, &self.keys.redirect_count)?;
        Ok(RedirectState {
            last_redirect_ms,
            count: u32::try_from(count).unwrap_or(u32::MAX),
        })
    }

    /// Write the counters.
    pub fn store_state(&mut self, state: &RedirectState) -> Result<(), StoreError> {
        self.store.set(&self.keys.last_redirect, &state.last_redirect_ms.to_string())?;
        self.store.set(&self.keys.redirect_count, &state.count.to_string())
    }

    /// Current status. Unreadable counters report `Clear`.
    pub fn status(&self) -> GuardStatus {
        self.load_state()
            .map(|s| s.status(self.clock.now_ms(), &self.policy))
            .unwrap_or(GuardStatus::Clear)
    }

    /// Validate `target`, check the guard, bump the counters and navigate.
    ///
    /// Counter read or write failures never block the redirect.
    pub fn try_redirect<N: Navigator + ?Sized>(
        &mut self,
        target: &str,
        navigator: &mut N,
    ) -> Result<RedirectMethod, RedirectError> {
        let now = self.clock.now_ms();

        let next = match self.load_state() {
            Ok(state) => match attempt_redirect(state, now, &self.policy) {
                (next, RedirectOutcome::Permitted { .. }) => next,
                (_, RedirectOutcome::Refused { count }) => {
                    log::warn!(
                        "Maximum redirect attempts reached, aborting (count={count}, maxAttempts={})",
                        self.policy.max_attempts
                    );
                    return Err(RedirectError::Refused {
                        count,
                        max: self.policy.max_attempts,
                    });
                }
            },
            Err(e) => {
                log::error!("Failed to check redirect safety: {e}");
                RedirectState {
                    last_redirect_ms: now,
                    count: 1,
                }
            }
        };

        if let Err(e) = url::Url::parse(target) {
            return Err(NavigationError::InvalidTarget {
                url: target.to_string(),
                reason: e.to_string(),
            }
            .into());
        }

        match self.store_state(&next) {
            Ok(()) => log::debug!("Redirect tracking updated (timestamp={now}, count={})", next.count),
            Err(e) => log::error!("Failed to update redirect tracking: {e}"),
        }

        let method = navigate(navigator, target)?;
        log::info!("Redirect completed using {}", method.as_str());
        Ok(method)
    }

    /// [`Self::try_redirect`] reduced to success or failure.
    pub fn redirect<N: Navigator + ?Sized>(&mut self, target: &str, navigator: &mut N) -> bool {
        match self.try_redirect(target, navigator) {
            Ok(_) => true,
            Err(e) => {
                log::error!("Redirect failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::navigator::RecordingNavigator;
    use crate::store::MemoryStore;

    const T0: u64 = 1_700_000_000_000;

    /// Store whose writes always fail.
    struct ReadOnlyStore(MemoryStore);

    impl KvStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteFailed {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            })
        }
    }

    #[test]
    fn test_pure_transitions() {
        let policy = GuardPolicy::default();
        let mut state = RedirectState::default();
        assert_eq!(state.status(T0, &policy), GuardStatus::Clear);

        for expected in 1..=3 {
            let (next, outcome) = attempt_redirect(state, T0 + expected as u64, &policy);
            assert_eq!(outcome, RedirectOutcome::Permitted { count: expected });
            state = next;
        }
        assert_eq!(state.status(T0 + 10, &policy), GuardStatus::Blocked);

        let (same, outcome) = attempt_redirect(state, T0 + 100, &policy);
        assert_eq!(outcome, RedirectOutcome::Refused { count: 3 });
        assert_eq!(same, state);

        // Window is measured from the last permitted redirect
        let (next, outcome) = attempt_redirect(state, T0 + 3 + 5_001, &policy);
        assert_eq!(outcome, RedirectOutcome::Permitted { count: 1 });
        assert_eq!(next.last_redirect_ms, T0 + 5_004);
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let policy = GuardPolicy::default();
        let state = RedirectState {
            last_redirect_ms: T0,
            count: 3,
        };
        assert_eq!(state.status(T0 + 5_000, &policy), GuardStatus::Blocked);
        assert_eq!(state.status(T0 + 5_001, &policy), GuardStatus::Clear);
    }

    #[test]
    fn test_counting_status() {
        let policy = GuardPolicy::default();
        let state = RedirectState {
            last_redirect_ms: T0,
            count: 2,
        };
        assert_eq!(state.status(T0 + 1, &policy), GuardStatus::Counting);
    }

    #[test]
    fn test_clock_skew_does_not_reset() {
        let policy = GuardPolicy::default();
        let state = RedirectState {
            last_redirect_ms: T0,
            count: 3,
        };
        let (_, outcome) = attempt_redirect(state, T0 - 60_000, &policy);
        assert!(!outcome.is_permitted());
    }

    #[test]
    fn test_fourth_redirect_refused_then_reset() {
        let mut store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let keys = StorageKeys::default();
        let mut nav = RecordingNavigator::new();

        {
            let mut guard = RedirectGuard::new(&mut store, &clock, &keys, GuardPolicy::default());
            for _ in 0..3 {
                assert!(guard.redirect("https://example.com/", &mut nav));
                clock.advance(1_000);
            }
            assert!(!guard.redirect("https://example.com/", &mut nav));
            assert_eq!(guard.status(), GuardStatus::Blocked);
        }
        assert_eq!(nav.visits.len(), 3);

        clock.advance(5_001);
        let mut guard = RedirectGuard::new(&mut store, &clock, &keys, GuardPolicy::default());
        assert!(guard.redirect("https://example.com/", &mut nav));
        assert_eq!(guard.load_state().unwrap().count, 1);
        assert_eq!(store.get("tts_redirect_count").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_persisted_as_strings() {
        let mut store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let keys = StorageKeys::default();
        let mut nav = RecordingNavigator::new();

        let mut guard = RedirectGuard::new(&mut store, &clock, &keys, GuardPolicy::default());
        assert!(guard.redirect("https://example.com/", &mut nav));
        assert_eq!(store.get("tts_last_redirect").unwrap(), Some(T0.to_string()));
        assert_eq!(store.get("tts_redirect_count").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_corrupt_counters_fail_open() {
        let mut store = MemoryStore::new();
        store.set("tts_redirect_count", "NaN").unwrap();
        store.set("tts_last_redirect", &T0.to_string()).unwrap();
        let clock = ManualClock::new(T0 + 1);
        let keys = StorageKeys::default();
        let mut nav = RecordingNavigator::new();

        let mut guard = RedirectGuard::new(&mut store, &clock, &keys, GuardPolicy::default());
        assert!(guard.redirect("https://example.com/clean", &mut nav));
        assert_eq!(nav.last_url(), Some("https://example.com/clean"));
        assert_eq!(store.get("tts_redirect_count").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_write_failure_still_redirects() {
        let mut store = ReadOnlyStore(MemoryStore::new());
        let clock = ManualClock::new(T0);
        let keys = StorageKeys::default();
        let mut nav = RecordingNavigator::new();

        let mut guard = RedirectGuard::new(&mut store, &clock, &keys, GuardPolicy::default());
        assert!(guard.redirect("https://example.com/", &mut nav));
        assert_eq!(nav.visits.len(), 1);
    }

    #[test]
    fn test_invalid_target_aborts_without_counting() {
        let mut store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let keys = StorageKeys::default();
        let mut nav = RecordingNavigator::new();

        let mut guard = RedirectGuard::new(&mut store, &clock, &keys, GuardPolicy::default());
        let err = guard.try_redirect("not a url", &mut nav).unwrap_err();
        assert!(matches!(
            err,
            RedirectError::Navigation(NavigationError::InvalidTarget { .. })
        ));
        assert!(nav.visits.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_navigation_failure_reports_false() {
        let mut store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let keys = StorageKeys::default();
        let mut nav = RecordingNavigator {
            fail_with: Some("blocked".into()),
            ..RecordingNavigator::new()
        };

        let mut guard = RedirectGuard::new(&mut store, &clock, &keys, GuardPolicy::default());
        assert!(!guard.redirect("https://example.com/", &mut nav));
    }

    #[test]
    fn test_custom_ceiling() {
        let mut store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let keys = StorageKeys::default();
        let mut nav = RecordingNavigator::new();
        let policy = GuardPolicy {
            max_attempts: 1,
            window_ms: 5_000,
        };

        let mut guard = RedirectGuard::new(&mut store, &clock, &keys, policy);
        assert!(guard.redirect("https://example.com/", &mut nav));
        assert!(matches!(
            guard.try_redirect("https://example.com/", &mut nav),
            Err(RedirectError::Refused { count: 1, max: 1 })
        ));
    }
}
