//! WebAssembly bindings for TokenStrip
//!
//! Call `run()` as early as possible during page load (a userscript at
//! `document-start`, or an extension content script).

mod host;

use std::sync::OnceLock;

use wasm_bindgen::prelude::*;

use tts_core::error_log::read_error_log;
use tts_core::logger::{self, StripLogger};
use tts_core::{default_token_set, sanitize, RunOutcome, StripperConfig, TrackingTokenStripper};

pub use host::{BrowserNavigator, ConsoleSink, JsClock, LocalStorageStore};

static LOGGER: OnceLock<StripLogger<ConsoleSink, JsClock>> = OnceLock::new();

fn init_logging(config: &StripperConfig) {
    if LOGGER.get().is_some() {
        return;
    }
    let logger = LOGGER.get_or_init(|| StripLogger::new(ConsoleSink, JsClock, config.log_level()));
    // Another logger may already be installed by the embedding page
    let _ = logger::install(logger);
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(target, &key.into(), value);
}

fn outcome_to_js(outcome: &RunOutcome) -> JsValue {
    let result = js_sys::Object::new();
    match outcome {
        RunOutcome::Unchanged => {
            set(&result, "outcome", &"unchanged".into());
        }
        RunOutcome::Redirected { url, method } => {
            set(&result, "outcome", &"redirected".into());
            set(&result, "url", &JsValue::from_str(url));
            set(&result, "method", &JsValue::from_str(method.as_str()));
        }
        RunOutcome::Refused { url } => {
            set(&result, "outcome", &"refused".into());
            set(&result, "url", &JsValue::from_str(url));
        }
        RunOutcome::Failed { url, reason } => {
            set(&result, "outcome", &"failed".into());
            set(&result, "url", &JsValue::from_str(url));
            set(&result, "reason", &JsValue::from_str(reason));
        }
    }
    result.into()
}

/// Strip tracking tokens from the current page URL.
///
/// Never throws; the returned object describes what happened.
#[wasm_bindgen]
pub fn run() -> JsValue {
    let config = StripperConfig::default();
    init_logging(&config);

    let window = match web_sys::window() {
        Some(window) => window,
        None => {
            log::warn!("No window available, skipping");
            return outcome_to_js(&RunOutcome::Unchanged);
        }
    };

    let current_url = match window.location().href() {
        Ok(href) => href,
        Err(e) => {
            log::error!("Critical error in main execution: cannot read location ({e:?})");
            return outcome_to_js(&RunOutcome::Unchanged);
        }
    };
    let user_agent = window.navigator().user_agent().unwrap_or_default();

    let store = LocalStorageStore::new(Some(&window));
    let mut stripper = TrackingTokenStripper::new(config, store, JsClock).with_user_agent(user_agent);
    let mut navigator = BrowserNavigator::new(window);

    let outcome = stripper.run(&current_url, &mut navigator);
    outcome_to_js(&outcome)
}

/// Sanitize an arbitrary URL. Returns `undefined` when nothing changes.
#[wasm_bindgen]
pub fn sanitize_url(url: &str) -> Option<String> {
    sanitize(url)
}

/// Number of distinct tracking parameters on the denylist.
#[wasm_bindgen]
pub fn token_count() -> usize {
    default_token_set().len()
}

/// The persisted error log as a JSON array string.
#[wasm_bindgen]
pub fn error_log_json() -> String {
    let config = StripperConfig::default();
    let store = LocalStorageStore::new(web_sys::window().as_ref());
    read_error_log(&store, &config.storage_keys.error_log)
        .ok()
        .and_then(|entries| serde_json::to_string(&entries).ok())
        .unwrap_or_else(|| "[]".to_string())
}
