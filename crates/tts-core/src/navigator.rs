//! Address bar access
//!
//! The browser binding implements [`Navigator`] over `history` and
//! `location`; [`RecordingNavigator`] stands in everywhere else.

use crate::types::RedirectMethod;

/// Error type for address bar updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("{0} is not available")]
    Unsupported(&'static str),
    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },
    #[error("Navigation failed: {0}")]
    Host(String),
}

/// Host navigation capability.
pub trait Navigator {
    /// Replace the current history entry without reloading.
    /// Returns [`NavigationError::Unsupported`] when the API is missing.
    fn replace_state(&mut self, url: &str) -> Result<(), NavigationError>;

    /// Replace the current location with a full navigation.
    fn location_replace(&mut self, url: &str) -> Result<(), NavigationError>;
}

/// Rewrite the address bar, preferring history replacement.
///
/// Only a missing history API falls back to `location_replace`; any other
/// history failure is returned as-is.
pub fn navigate<N: Navigator + ?Sized>(navigator: &mut N, url: &str) -> Result<RedirectMethod, NavigationError> {
    match navigator.replace_state(url) {
        Ok(()) => Ok(RedirectMethod::ReplaceState),
        Err(NavigationError::Unsupported(api)) => {
            log::debug!("{api} unavailable, falling back to location.replace");
            navigator.location_replace(url)?;
            Ok(RedirectMethod::LocationReplace)
        }
        Err(e) => Err(e),
    }
}

/// Navigator that records requests instead of performing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    /// Simulate a host without `history.replaceState`
    pub history_supported: bool,
    /// Force every navigation to fail with this message
    pub fail_with: Option<String>,
    pub visits: Vec<(RedirectMethod, String)>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self {
            history_supported: true,
            ..Self::default()
        }
    }

    pub fn without_history() -> Self {
        Self::default()
    }

    pub fn last_url(&self) -> Option<&str> {
        self.visits.last().map(|(_, url)| url.as_str())
    }

    fn record(&mut self, method: RedirectMethod, url: &str) -> Result<(), NavigationError> {
        if let Some(reason) = &self.fail_with {
            return Err(NavigationError::Host(reason.clone()));
        }
        self.visits.push((method, url.to_string()));
        Ok(())
    }
}

impl Navigator for RecordingNavigator {
    fn replace_state(&mut self, url: &str) -> Result<(), NavigationError> {
        if !self.history_supported {
            return Err(NavigationError::Unsupported("history.replaceState"));
        }
        self.record(RedirectMethod::ReplaceState, url)
    }

    fn location_replace(&mut self, url: &str) -> Result<(), NavigationError> {
        self.record(RedirectMethod::LocationReplace, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_replace_state() {
        let mut nav = RecordingNavigator::new();
        let method = navigate(&mut nav, "https://a.com/").unwrap();
        assert_eq!(method, RedirectMethod::ReplaceState);
        assert_eq!(nav.last_url(), Some("https://a.com/"));
    }

    #[test]
    fn test_falls_back_without_history() {
        let mut nav = RecordingNavigator::without_history();
        let method = navigate(&mut nav, "https://a.com/").unwrap();
        assert_eq!(method, RedirectMethod::LocationReplace);
        assert_eq!(nav.visits.len(), 1);
    }

    #[test]
    fn test_host_failure_does_not_fall_back() {
        let mut nav = RecordingNavigator {
            fail_with: Some("SecurityError".into()),
            ..RecordingNavigator::new()
        };
        let err = navigate(&mut nav, "https://a.com/").unwrap_err();
        assert_eq!(err, NavigationError::Host("SecurityError".into()));
        assert!(nav.visits.is_empty());
    }
}
