//! In-memory secondary store.
//!
//! Holds the encoded record buffer behind a shared handle, so a caller can
//! keep a clone after handing the store to an engine and inspect what was
//! persisted. Failure injection via [`MemoryStore::set_unavailable`] makes
//! every subsequent call fail with [`StoreError::Unavailable`].
//!
//! ```
//! use tiercache::store::{MemoryStore, SecondaryStore};
//!
//! let store = MemoryStore::new();
//! let mut writer = store.clone();
//! writer.append("k", "v").unwrap();
//!
//! assert_eq!(store.contents(), "k:v;");
//! assert_eq!(store.append_count(), 1);
//! ```

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::error::StoreError;
use crate::store::line_format::{self, Decoded};
use crate::store::traits::SecondaryStore;

#[derive(Debug, Default)]
struct Inner {
    buffer: String,
    appends: usize,
    unavailable: bool,
}

/// Shared in-memory buffer of `key:value;` records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose buffer already holds `text`, as if written by
    /// an earlier run.
    pub fn with_contents(text: impl Into<String>) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().buffer = text.into();
        store
    }

    /// Makes later calls fail (`true`) or succeed (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.borrow_mut().unavailable = unavailable;
    }

    /// Raw buffer contents.
    pub fn contents(&self) -> String {
        self.inner.borrow().buffer.clone()
    }

    /// Number of successful appends.
    pub fn append_count(&self) -> usize {
        self.inner.borrow().appends
    }

    /// Keys of all well-formed records, in append order.
    pub fn keys(&self) -> Vec<String> {
        line_format::decode_records(&self.inner.borrow().buffer)
            .records
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.borrow().unavailable {
            return Err(io::Error::other("memory store marked unavailable").into());
        }
        Ok(())
    }
}

impl SecondaryStore for MemoryStore {
    fn append(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let record = line_format::encode_record(key, value)?;
        let mut inner = self.inner.borrow_mut();
        inner.buffer.push_str(&record);
        inner.appends += 1;
        Ok(())
    }

    fn load_all(&mut self) -> Result<Decoded, StoreError> {
        self.check_available()?;
        Ok(line_format::decode_records(&self.inner.borrow().buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_buffer() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.append("a", "1").unwrap();
        writer.append("b", "2").unwrap();
        assert_eq!(store.keys(), vec!["a", "b"]);
        assert_eq!(store.append_count(), 2);
    }

    #[test]
    fn seeded_contents_are_loaded() {
        let mut store = MemoryStore::with_contents("x:9;y:trunc");
        let decoded = store.load_all().unwrap();
        assert_eq!(decoded.records, vec![("x".to_string(), "9".to_string())]);
        assert_eq!(decoded.malformed[0].segment, "y:trunc");
    }

    #[test]
    fn unavailable_store_fails_every_call() {
        let mut store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.append("a", "1").unwrap_err().is_unavailable());
        assert!(store.load_all().unwrap_err().is_unavailable());
        store.set_unavailable(false);
        assert!(store.append("a", "1").is_ok());
    }

    #[test]
    fn rejected_record_does_not_count_as_append() {
        let mut store = MemoryStore::new();
        assert!(store.append("a", "x;y").is_err());
        assert_eq!(store.append_count(), 0);
        assert_eq!(store.contents(), "");
    }
}
