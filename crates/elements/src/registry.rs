//! Tag-name registry - which tags are custom elements, and how to build
//! their brokers
//!
//! Append-only for the lifetime of the engine; there is no unregistration.
//! Duplicate policy: the first registration wins, later ones are ignored.

use crate::broker::BrokerFactory;
use crate::error::{LifecycleError, Result};
use ahash::AHashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;

/// Mapping from lowercase tag name to broker factory
#[derive(Default)]
pub struct ElementRegistry {
    entries: AHashMap<String, Rc<dyn BrokerFactory>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a tag → factory association
    ///
    /// Custom element names must contain the `-` separator, so they can
    /// never collide with built-in tags. Returns `Ok(false)` when the tag
    /// was already registered; the existing factory is kept.
    pub fn register(&mut self, name: &str, factory: Rc<dyn BrokerFactory>) -> Result<bool> {
        if !name.contains('-') || name.starts_with('-') {
            return Err(LifecycleError::InvalidElementName {
                name: name.to_string(),
            });
        }

        match self.entries.entry(name.to_ascii_lowercase()) {
            Entry::Occupied(_) => {
                tracing::debug!("[Registry] Ignoring duplicate registration of <{}>", name);
                Ok(false)
            }
            Entry::Vacant(slot) => {
                tracing::debug!("[Registry] Registered <{}>", name);
                slot.insert(factory);
                Ok(true)
            }
        }
    }

    /// Check whether a tag name is registered (case-insensitive)
    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Factory for a lowercase tag name
    pub fn factory(&self, tag: &str) -> Option<Rc<dyn BrokerFactory>> {
        self.entries.get(tag).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
