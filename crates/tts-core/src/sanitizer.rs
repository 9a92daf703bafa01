//! URL sanitizer
//!
//! [`sanitize`] is the pure entry point. [`Sanitizer`] adds logging, timing
//! and the persisted error log on top of it.

use crate::clock::Clock;
use crate::error_log::{record_error, ErrorLogEntry};
use crate::logger::PERF_TARGET;
use crate::registry::{default_token_set, TokenSet};
use crate::store::KvStore;
use crate::types::SanitizeReport;
use crate::url::{is_web_url, remove_query_params};

/// Error type for a sanitization pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanitizeError {
    #[error("Sanitized URL '{url}' no longer parses: {reason}")]
    InvalidOutput { url: String, reason: String },
}

/// Whether `url` is something the sanitizer will touch.
///
/// Empty input, anything the WHATWG parser rejects and any scheme other than
/// `http`/`https` are skipped.
pub fn is_processable(url: &str) -> bool {
    !url.is_empty() && is_web_url(url) && url::Url::parse(url).is_ok()
}

/// Strip tracking parameters using `tokens`.
///
/// `Ok(None)` means the URL was skipped or nothing was removed.
pub fn sanitize_with(url: &str, tokens: &TokenSet) -> Result<Option<SanitizeReport>, SanitizeError> {
    if !is_processable(url) {
        return Ok(None);
    }

    let stripped = match remove_query_params(url, tokens) {
        Some(stripped) => stripped,
        None => return Ok(None),
    };

    if stripped.url == url {
        return Ok(None);
    }

    if let Err(e) = url::Url::parse(&stripped.url) {
        return Err(SanitizeError::InvalidOutput {
            url: stripped.url,
            reason: e.to_string(),
        });
    }

    Ok(Some(SanitizeReport {
        sanitized: stripped.url,
        removed: stripped.removed,
    }))
}

/// Strip every default tracking parameter from `url`.
/// Returns the cleaned URL, or None if no changes.
///
/// # Examples
///
/// ```
/// use tts_core::sanitize;
///
/// assert_eq!(
///     sanitize("https://example.com/page?utm_source=x&id=5&fbclid=abc").as_deref(),
///     Some("https://example.com/page?id=5"),
/// );
/// assert_eq!(sanitize("https://example.com/?foo=bar"), None);
/// assert_eq!(sanitize("not a url"), None);
/// ```
pub fn sanitize(url: &str) -> Option<String> {
    sanitize_with(url, default_token_set())
        .ok()
        .flatten()
        .map(|report| report.sanitized)
}

// =============================================================================
// Logging Sanitizer
// =============================================================================

/// Sanitizer that logs its work and records failures to the error log.
pub struct Sanitizer<'t> {
    tokens: &'t TokenSet,
    error_log_key: String,
    error_log_capacity: usize,
    perf: bool,
}

impl<'t> Sanitizer<'t> {
    pub fn new(tokens: &'t TokenSet, error_log_key: impl Into<String>, error_log_capacity: usize) -> Self {
        Self {
            tokens,
            error_log_key: error_log_key.into(),
            error_log_capacity,
            perf: false,
        }
    }

    /// Log sanitization timings under the `tts::perf` target.
    pub fn with_perf(mut self, enabled: bool) -> Self {
        self.perf = enabled;
        self
    }

    pub fn tokens(&self) -> &TokenSet {
        self.tokens
    }

    /// Sanitize `url`, never failing.
    ///
    /// Errors are logged and appended to the error log (best-effort) and the
    /// result degrades to "no change".
    pub fn sanitize<S, C>(&self, url: &str, store: &mut S, clock: &C, user_agent: &str) -> Option<SanitizeReport>
    where
        S: KvStore + ?Sized,
        C: Clock + ?Sized,
    {
        let started = clock.precise_ms();
        log::debug!("Starting URL sanitization: {url}");

        if !is_processable(url) {
            log::warn!("Invalid URL provided, skipping sanitization");
            return None;
        }

        let result = sanitize_with(url, self.tokens);

        if self.perf {
            log::debug!(
                target: PERF_TARGET,
                "URL sanitization completed in {:.2}ms",
                clock.precise_ms() - started
            );
        }

        self.settle(url, result, store, clock, user_agent)
    }

    /// Log a sanitization result and record a failure to the error log.
    fn settle<S, C>(
        &self,
        url: &str,
        result: Result<Option<SanitizeReport>, SanitizeError>,
        store: &mut S,
        clock: &C,
        user_agent: &str,
    ) -> Option<SanitizeReport>
    where
        S: KvStore + ?Sized,
        C: Clock + ?Sized,
    {
        match result {
            Ok(Some(report)) => {
                log::info!(
                    "Sanitization complete: removed {} tracking tokens {:?} ({} -> {} bytes)",
                    report.removed.len(),
                    report.removed,
                    url.len(),
                    report.sanitized.len()
                );
                Some(report)
            }
            Ok(None) => {
                log::debug!("No tracking tokens found in URL");
                None
            }
            Err(e) => {
                log::error!("URL sanitization failed: {e}");
                let entry = ErrorLogEntry::new(clock.now_ms(), e.to_string(), url, user_agent);
                record_error(store, &self.error_log_key, entry, self.error_log_capacity);
                None
            }
        }
    }
}
