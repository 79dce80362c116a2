//! Session persistence over a key-value store.
//!
//! The engine persists the current design and a product signature
//! (product id + variant) under fixed keys. A saved design is restored
//! only when the stored signature matches the signature asked for, so
//! a design never leaks across products or variants. Writes are best
//! effort: a store that rejects a write (quota) is logged and ignored.

use std::collections::HashMap;

use log::warn;

use crate::error::StoreError;

/// Storage key for the serialized design snapshot.
pub const DESIGN_KEY: &str = "easel_current_design";
/// Storage key for the design's product signature.
pub const SIGNATURE_KEY: &str = "easel_current_signature";

/// Minimal key-value storage seam (a browser session store, a file, a
/// test double).
pub trait KeyValueStore {
    /// Read a value.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot accept the write.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Signature-checked design persistence over any [`KeyValueStore`].
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Wrap a backing store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Persist a snapshot under the given signature.
    ///
    /// Best effort: a rejected write is logged and swallowed, and a
    /// failed signature write removes nothing already stored.
    pub fn save(&mut self, signature: &str, snapshot: &str) {
        if let Err(error) = self.store.set_item(DESIGN_KEY, snapshot) {
            warn!("session save failed: {error}");
            return;
        }
        if let Err(error) = self.store.set_item(SIGNATURE_KEY, signature) {
            warn!("session signature save failed: {error}");
        }
    }

    /// Load the stored snapshot, but only when the stored signature
    /// matches `signature` exactly.
    #[must_use]
    pub fn load(&self, signature: &str) -> Option<String> {
        let stored = self.store.get_item(SIGNATURE_KEY)?;
        if stored != signature {
            return None;
        }
        self.store.get_item(DESIGN_KEY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Store whose writes always fail, for the quota path.
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get_item(&self, _key: &str) -> Option<String> {
            None
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError {
                reason: "quota exceeded".to_owned(),
            })
        }
    }

    #[test]
    fn save_then_load_with_matching_signature() {
        let mut session = SessionStore::new(MemoryStore::new());
        session.save("shirt-42:red", "{\"objects\":[]}");
        assert_eq!(
            session.load("shirt-42:red").as_deref(),
            Some("{\"objects\":[]}")
        );
    }

    #[test]
    fn load_with_different_signature_returns_nothing() {
        let mut session = SessionStore::new(MemoryStore::new());
        session.save("shirt-42:red", "{\"objects\":[]}");
        assert!(
            session.load("shirt-42:blue").is_none(),
            "a design must not restore onto a different variant"
        );
        assert!(session.load("mug-7:red").is_none());
    }

    #[test]
    fn load_from_an_empty_store_returns_nothing() {
        let session = SessionStore::new(MemoryStore::new());
        assert!(session.load("shirt-42:red").is_none());
    }

    #[test]
    fn newer_save_overwrites_the_older() {
        let mut session = SessionStore::new(MemoryStore::new());
        session.save("shirt-42:red", "first");
        session.save("shirt-42:red", "second");
        assert_eq!(session.load("shirt-42:red").as_deref(), Some("second"));
    }

    #[test]
    fn rejected_write_is_swallowed() {
        let mut session = SessionStore::new(FullStore);
        session.save("shirt-42:red", "{\"objects\":[]}");
        assert!(session.load("shirt-42:red").is_none());
    }
}
