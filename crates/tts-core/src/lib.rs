//! TokenStrip Core Library
//!
//! This crate strips known tracking query parameters (click IDs, UTM tags,
//! email campaign IDs, ...) from page URLs and guards the resulting in-place
//! redirect against loops.
//!
//! # Architecture
//!
//! Matching works on the raw URL string against a flattened denylist, so
//! every byte outside the removed parameters is preserved. The redirect guard
//! keeps two counters in a host-provided key-value store and refuses more
//! than a few redirects inside a short window. Host capabilities (storage,
//! clock, address bar) are traits so everything here runs without a browser.
//!
//! # Modules
//!
//! - `registry`: Categorized tracking token denylist
//! - `url`: Raw URL splitting and query parameter removal
//! - `sanitizer`: Validation plus the `sanitize` entry point
//! - `guard`: Redirect loop guard state machine
//! - `navigator`: Address bar abstraction
//! - `store`: Persisted key-value storage
//! - `error_log`: Capped diagnostic error log
//! - `stripper`: Page-load orchestration
//! - `logger`: `log` backend used by the hosts
//! - `clock`, `config`, `types`: Shared plumbing

pub mod clock;
pub mod config;
pub mod error_log;
pub mod guard;
pub mod logger;
pub mod navigator;
pub mod registry;
pub mod sanitizer;
pub mod store;
pub mod stripper;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StripperConfig;
pub use guard::{attempt_redirect, GuardPolicy, GuardStatus, RedirectGuard, RedirectOutcome, RedirectState};
pub use navigator::{Navigator, NavigationError, RecordingNavigator};
pub use registry::{default_token_set, TokenSet, TRACKING_TOKENS};
pub use sanitizer::{sanitize, sanitize_with, Sanitizer};
pub use store::{KvStore, MemoryStore, StorageKeys, StoreError};
pub use stripper::TrackingTokenStripper;
pub use types::{RedirectMethod, RunOutcome, SanitizeReport};
