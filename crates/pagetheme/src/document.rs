//! Document styling hook

use std::collections::HashMap;

use ahash::RandomState;
use parking_lot::RwLock;

/// Where the controller mirrors the active theme
pub trait DocumentHook {
    /// Set an attribute on the document root element
    fn set_root_attribute(&self, name: &str, value: &str);

    /// Set the `content` of `<meta name=..>`, creating the tag if missing
    fn set_meta(&self, name: &str, content: &str);
}

/// In-memory document for hosts without a DOM and for tests
#[derive(Default)]
pub struct MemoryDocument {
    attributes: RwLock<HashMap<String, String, RandomState>>,
    meta: RwLock<HashMap<String, String, RandomState>>,
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a root attribute
    pub fn root_attribute(&self, name: &str) -> Option<String> {
        self.attributes.read().get(name).cloned()
    }

    /// Read a metadata tag's content
    pub fn meta(&self, name: &str) -> Option<String> {
        self.meta.read().get(name).cloned()
    }
}

impl DocumentHook for MemoryDocument {
    fn set_root_attribute(&self, name: &str, value: &str) {
        self.attributes
            .write()
            .insert(name.to_string(), value.to_string());
    }

    fn set_meta(&self, name: &str, content: &str) {
        self.meta
            .write()
            .insert(name.to_string(), content.to_string());
    }
}

impl<D: DocumentHook + ?Sized> DocumentHook for std::sync::Arc<D> {
    fn set_root_attribute(&self, name: &str, value: &str) {
        (**self).set_root_attribute(name, value)
    }

    fn set_meta(&self, name: &str, content: &str) {
        (**self).set_meta(name, content)
    }
}
