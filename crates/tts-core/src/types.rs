//! Core type definitions for TokenStrip
//!
//! Shared between the sanitizer, the redirect guard and the host bindings.

use serde::Serialize;

// =============================================================================
// Scheme Masks
// =============================================================================

bitflags::bitflags! {
    /// URL scheme mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SchemeMask: u8 {
        const HTTP = 1 << 0;
        const HTTPS = 1 << 1;
        /// Schemes the sanitizer is allowed to rewrite
        const WEB = Self::HTTP.bits() | Self::HTTPS.bits();
    }
}

// =============================================================================
// Sanitize Report
// =============================================================================

/// Result of a sanitization pass that changed the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    /// The rewritten URL
    pub sanitized: String,
    /// Decoded keys of every removed parameter, in URL order (repeats included)
    pub removed: Vec<String>,
}

impl SanitizeReport {
    /// Bytes saved relative to the original URL.
    pub fn bytes_removed(&self, original: &str) -> usize {
        original.len().saturating_sub(self.sanitized.len())
    }
}

// =============================================================================
// Redirect Method
// =============================================================================

/// How the address bar was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RedirectMethod {
    /// In-place history replacement (no reload, no new entry)
    ReplaceState,
    /// Full navigation replace (reload)
    LocationReplace,
}

impl RedirectMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReplaceState => "replaceState",
            Self::LocationReplace => "location.replace",
        }
    }
}

// =============================================================================
// Run Outcome
// =============================================================================

/// Final result of one page-load run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RunOutcome {
    /// Nothing to strip, or the URL was not processable
    Unchanged,
    /// Tracking tokens were stripped and the address bar rewritten
    Redirected {
        url: String,
        method: RedirectMethod,
    },
    /// The redirect guard refused (too many recent redirects)
    Refused { url: String },
    /// The redirect was permitted but could not be performed
    Failed { url: String, reason: String },
}

impl RunOutcome {
    pub fn is_redirected(&self) -> bool {
        matches!(self, Self::Redirected { .. })
    }
}
