//! Browser implementations of the core host traits

use wasm_bindgen::JsValue;
use web_sys::{Storage, Window};

use tts_core::logger::LogSink;
use tts_core::navigator::{NavigationError, Navigator};
use tts_core::store::{KvStore, StoreError};
use tts_core::Clock;

fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

// =============================================================================
// Storage
// =============================================================================

/// `window.localStorage`, scoped to the page origin.
///
/// When storage is blocked (sandboxed frames, privacy modes) every access
/// fails, which makes the redirect guard fail open.
pub struct LocalStorageStore {
    storage: Option<Storage>,
}

impl LocalStorageStore {
    pub fn new(window: Option<&Window>) -> Self {
        let storage = window.and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StoreError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("localStorage".to_string()))
    }
}

impl KvStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(js_error(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                reason: js_error(&e),
            })
    }
}

// =============================================================================
// Navigation
// =============================================================================

/// Address bar access through `history` and `location`.
pub struct BrowserNavigator {
    window: Window,
}

impl BrowserNavigator {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Navigator for BrowserNavigator {
    fn replace_state(&mut self, url: &str) -> Result<(), NavigationError> {
        let history = self
            .window
            .history()
            .map_err(|_| NavigationError::Unsupported("history.replaceState"))?;
        history
            .replace_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(|e| NavigationError::Host(js_error(&e)))
    }

    fn location_replace(&mut self, url: &str) -> Result<(), NavigationError> {
        self.window
            .location()
            .replace(url)
            .map_err(|e| NavigationError::Host(js_error(&e)))
    }
}

// =============================================================================
// Clock
// =============================================================================

/// `Date.now()`; `SystemTime` is unavailable on wasm32-unknown-unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn precise_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

// =============================================================================
// Console
// =============================================================================

/// Writes log lines to the devtools console.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write_line(&self, level: log::Level, line: &str) {
        let line = JsValue::from_str(line);
        match level {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }
}
