//! Page-load orchestration
//!
//! Capture the URL once, sanitize it, and if anything was stripped ask the
//! redirect guard to rewrite the address bar. Every failure degrades to
//! leaving the page alone.

use crate::clock::Clock;
use crate::config::StripperConfig;
use crate::guard::{GuardStatus, RedirectError, RedirectGuard};
use crate::navigator::Navigator;
use crate::registry::{default_token_set, TokenSet};
use crate::sanitizer::Sanitizer;
use crate::store::KvStore;
use crate::types::RunOutcome;

/// Tracking token stripper bound to a host store and clock.
pub struct TrackingTokenStripper<S: KvStore, C: Clock> {
    config: StripperConfig,
    tokens: &'static TokenSet,
    store: S,
    clock: C,
    user_agent: String,
}

impl<S: KvStore, C: Clock> TrackingTokenStripper<S, C> {
    pub fn new(config: StripperConfig, store: S, clock: C) -> Self {
        Self {
            config,
            tokens: default_token_set(),
            store,
            clock,
            user_agent: String::new(),
        }
    }

    /// Replace the default denylist.
    pub fn with_tokens(mut self, tokens: &'static TokenSet) -> Self {
        self.tokens = tokens;
        self
    }

    /// User agent recorded in error log entries.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn config(&self) -> &StripperConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Redirect guard status right now.
    pub fn guard_status(&mut self) -> GuardStatus {
        let policy = self.config.guard_policy();
        RedirectGuard::new(&mut self.store, &self.clock, &self.config.storage_keys, policy).status()
    }

    /// Process one page load.
    pub fn run<N: Navigator + ?Sized>(&mut self, current_url: &str, navigator: &mut N) -> RunOutcome {
        let started = self.clock.precise_ms();
        log::info!("Script initialization started (url={current_url}, userAgent={})", self.user_agent);

        let sanitizer = Sanitizer::new(
            self.tokens,
            self.config.storage_keys.error_log.as_str(),
            self.config.error_log_capacity,
        )
        .with_perf(self.config.perf_enabled());

        let report = match sanitizer.sanitize(current_url, &mut self.store, &self.clock, &self.user_agent) {
            Some(report) if report.sanitized != current_url => report,
            _ => {
                log::debug!("No tracking tokens detected, no action needed");
                return RunOutcome::Unchanged;
            }
        };

        log::info!("Tracking tokens detected, initiating cleanup (from={current_url}, to={})", report.sanitized);

        let policy = self.config.guard_policy();
        let mut guard = RedirectGuard::new(&mut self.store, &self.clock, &self.config.storage_keys, policy);
        let outcome = match guard.try_redirect(&report.sanitized, navigator) {
            Ok(method) => {
                log::info!("URL cleanup successful");
                RunOutcome::Redirected {
                    url: report.sanitized,
                    method,
                }
            }
            Err(RedirectError::Refused { .. }) => {
                log::error!("Redirect aborted due to safety check failure");
                RunOutcome::Refused { url: report.sanitized }
            }
            Err(e) => {
                log::error!("URL cleanup failed: {e}");
                RunOutcome::Failed {
                    url: report.sanitized,
                    reason: e.to_string(),
                }
            }
        };

        if self.config.perf_enabled() {
            log::debug!(
                target: crate::logger::PERF_TARGET,
                "Page load run completed in {:.2}ms",
                self.clock.precise_ms() - started
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::navigator::RecordingNavigator;
    use crate::store::MemoryStore;
    use crate::types::RedirectMethod;

    const DIRTY: &str = "https://example.com/page?utm_source=x&id=5&fbclid=abc";
    const CLEAN: &str = "https://example.com/page?id=5";

    fn stripper() -> TrackingTokenStripper<MemoryStore, ManualClock> {
        TrackingTokenStripper::new(StripperConfig::default(), MemoryStore::new(), ManualClock::new(1_000_000))
            .with_user_agent("test-agent")
    }

    #[test]
    fn test_clean_url_is_left_alone() {
        let mut stripper = stripper();
        let mut nav = RecordingNavigator::new();
        assert_eq!(stripper.run("https://example.com/?foo=bar", &mut nav), RunOutcome::Unchanged);
        assert_eq!(stripper.run("not a url", &mut nav), RunOutcome::Unchanged);
        assert!(nav.visits.is_empty());
        assert!(stripper.store().is_empty());
    }

    #[test]
    fn test_dirty_url_is_replaced_in_place() {
        let mut stripper = stripper();
        let mut nav = RecordingNavigator::new();
        let outcome = stripper.run(DIRTY, &mut nav);
        assert_eq!(
            outcome,
            RunOutcome::Redirected {
                url: CLEAN.to_string(),
                method: RedirectMethod::ReplaceState,
            }
        );
        assert_eq!(nav.last_url(), Some(CLEAN));
        assert_eq!(stripper.guard_status(), GuardStatus::Counting);
    }

    #[test]
    fn test_fallback_navigation() {
        let mut stripper = stripper();
        let mut nav = RecordingNavigator::without_history();
        let outcome = stripper.run(DIRTY, &mut nav);
        assert!(outcome.is_redirected());
        assert_eq!(nav.visits, vec![(RedirectMethod::LocationReplace, CLEAN.to_string())]);
    }

    #[test]
    fn test_loop_is_cut_after_three() {
        let mut stripper = stripper();
        let mut nav = RecordingNavigator::new();
        for _ in 0..3 {
            assert!(stripper.run(DIRTY, &mut nav).is_redirected());
        }
        assert_eq!(
            stripper.run(DIRTY, &mut nav),
            RunOutcome::Refused { url: CLEAN.to_string() }
        );
        assert_eq!(nav.visits.len(), 3);

        stripper.clock.advance(5_001);
        assert!(stripper.run(DIRTY, &mut nav).is_redirected());
        assert_eq!(stripper.store().get("tts_redirect_count").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_navigation_failure_is_contained() {
        let mut stripper = stripper();
        let mut nav = RecordingNavigator {
            fail_with: Some("SecurityError".into()),
            ..RecordingNavigator::new()
        };
        match stripper.run(DIRTY, &mut nav) {
            RunOutcome::Failed { url, reason } => {
                assert_eq!(url, CLEAN);
                assert!(reason.contains("SecurityError"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_custom_tokens() {
        static TOKENS: std::sync::OnceLock<TokenSet> = std::sync::OnceLock::new();
        let tokens = TOKENS.get_or_init(|| ["session"].into_iter().collect());

        let mut stripper = stripper().with_tokens(tokens);
        let mut nav = RecordingNavigator::new();
        assert_eq!(stripper.run(DIRTY, &mut nav), RunOutcome::Unchanged);
        assert!(stripper
            .run("https://example.com/?session=1", &mut nav)
            .is_redirected());
    }
}
