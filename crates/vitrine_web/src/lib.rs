//! Vitrine Web
//!
//! Browser host for [`vitrine_core`]. Implements the core's host traits over
//! `web-sys`, pumps its scheduler with a single `setTimeout` and routes DOM
//! events into the [`Page`](vitrine_core::Page).
//!
//! Loading the wasm module is enough: the `start` entry point waits for
//! `DOMContentLoaded` when needed, reads an optional
//! `<script type="application/json" id="vitrine-config">` block and attaches
//! every listener.

pub mod clock;
pub mod document;
pub mod host;
pub mod logging;
pub mod storage;
pub mod timers;

pub use clock::PerformanceClock;
pub use document::WebDocument;
pub use host::WebHost;
pub use storage::LocalStorageFlags;
pub use timers::{FramePump, TimeoutPump};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{UrlSearchParams, Window};

use vitrine_core::{LaunchOptions, PageBuilder, PageConfig, VitrineError};

/// Id of the optional JSON configuration element
pub const CONFIG_ELEMENT_ID: &str = "vitrine-config";

/// Value of the force parameter that forces the announcement on
const FORCE_VALUE: &str = "1";

/// Module entry point
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| host_error("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| host_error("window has no document"))?;

    if document.ready_state() != "loading" {
        return launch(window);
    }

    let deferred = window.clone();
    let on_ready = Closure::once(move || {
        if let Err(err) = launch(deferred) {
            web_sys::console::error_1(&err);
        }
    });
    document.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
    on_ready.forget();
    Ok(())
}

/// Build the page against the loaded document and attach it
fn launch(window: Window) -> Result<(), JsValue> {
    let document = window
        .document()
        .ok_or_else(|| host_error("window has no document"))?;

    let (config, problem) = match read_config(&document) {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(err) => (PageConfig::default(), Some(err)),
    };
    logging::init(&config.log_filter);
    if let Some(err) = problem {
        tracing::warn!("vitrine_web::launch - {}, using defaults", err);
    }

    let options = LaunchOptions {
        force_announcement: force_requested(&window, &config.announcement.force_param),
    };
    let flags = LocalStorageFlags::new(&window);
    let page = PageBuilder::new(
        WebDocument::new(window.clone(), document),
        PerformanceClock,
        flags,
    )
    .config(config)
    .build()
    .map_err(into_js)?;

    let host = WebHost::new(page);
    host.start(options);
    host.attach(&window)?;
    tracing::info!("vitrine_web::launch - page attached");
    Ok(())
}

/// Parse the configuration block, if the page has one
fn read_config(document: &web_sys::Document) -> vitrine_core::Result<Option<PageConfig>> {
    let Some(element) = document.get_element_by_id(CONFIG_ELEMENT_ID) else {
        return Ok(None);
    };
    let json = element.text_content().unwrap_or_default();
    PageConfig::from_json(&json).map(Some)
}

/// Whether the location's query string carries `param=1`
fn force_requested(window: &Window, param: &str) -> bool {
    let search = window.location().search().unwrap_or_default();
    UrlSearchParams::new_with_str(&search)
        .ok()
        .and_then(|params| params.get(param))
        .as_deref()
        == Some(FORCE_VALUE)
}

/// Render a JS exception for logs and errors
pub(crate) fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn host_error(message: &str) -> JsValue {
    into_js(VitrineError::Host(message.to_string()))
}

fn into_js(err: VitrineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
