//! Browser bindings (wasm32 only)

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::ambient::AmbientSignal;
use crate::document::DocumentHook;

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

/// [`DocumentHook`] over the live DOM
#[derive(Default)]
pub struct WebDocument;

impl DocumentHook for WebDocument {
    fn set_root_attribute(&self, name: &str, value: &str) {
        if let Some(root) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
        {
            let _ = root.set_attribute(name, value);
        }
    }

    fn set_meta(&self, name: &str, content: &str) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let selector = format!("meta[name=\"{}\"]", name);
        let meta = match document.query_selector(&selector) {
            Ok(Some(meta)) => meta,
            _ => {
                let Ok(meta) = document.create_element("meta") else {
                    return;
                };
                let _ = meta.set_attribute("name", name);
                if let Some(head) = document.head() {
                    let _ = head.append_child(&meta);
                }
                meta
            }
        };
        let _ = meta.set_attribute("content", content);
    }
}

/// Ambient signal fed by `matchMedia('(prefers-color-scheme: dark)')`
///
/// Returns an unavailable signal when the browser has no `matchMedia`.
pub fn system_signal() -> AmbientSignal {
    let Some(query) = web_sys::window().and_then(|w| w.match_media(DARK_QUERY).ok().flatten()) else {
        return AmbientSignal::unavailable();
    };

    let signal = AmbientSignal::new(query.matches());

    let watched = query.clone();
    let target = signal.clone();
    let on_change = Closure::<dyn FnMut()>::new(move || target.set(watched.matches()));
    query.set_onchange(Some(on_change.as_ref().unchecked_ref()));
    // lives as long as the page
    on_change.forget();

    signal
}
