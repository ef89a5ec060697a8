//! File-backed secondary store.
//!
//! ## Architecture
//! - One file per store, opened in append mode and created if missing.
//! - Every [`append`](SecondaryStore::append) writes one encoded record and
//!   flushes before returning.
//! - A file left with an unterminated tail (a write cut short) is truncated
//!   back to its last `;` before the first append, so a new record never
//!   lands on the fragment. Until then the tail stays readable and is
//!   reported as malformed.
//! - [`load_all`](SecondaryStore::load_all) reads the whole file and decodes
//!   it with [`line_format::decode_records`]. Invalid UTF-8 is replaced rather
//!   than rejected.
//!
//! ## Example Usage
//! ```rust
//! use tiercache::store::{FileStore, SecondaryStore};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut store = FileStore::open(dir.path().join("cache_file.txt")).unwrap();
//! store.append("Cache1", "1").unwrap();
//! assert_eq!(store.load_all().unwrap().records, vec![("Cache1".to_string(), "1".to_string())]);
//! ```
//!
//! ## Thread Safety
//! - Appends are not serialised across processes or engines; give each
//!   engine its own path.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::line_format::{self, Decoded, RECORD_TERMINATOR};
use crate::store::traits::SecondaryStore;

/// Append-mode file holding `key:value;` records.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
    /// Length to truncate to before the next append, if the file ends in an
    /// unterminated fragment.
    torn_tail: Option<u64>,
}

impl FileStore {
    /// Opens (creating if needed) the store at `path`, including missing
    /// parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let torn_tail = terminated_len(&fs::read(&path)?);
        debug!(path = %path.display(), torn = torn_tail.is_some(), "opened secondary store");
        Ok(Self {
            path,
            file,
            torn_tail,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecondaryStore for FileStore {
    fn append(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let record = line_format::encode_record(key, value)?;
        if let Some(len) = self.torn_tail {
            self.file.set_len(len)?;
            self.torn_tail = None;
            warn!(path = %self.path.display(), len, "truncated unterminated tail");
        }
        self.file.write_all(record.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    fn load_all(&mut self) -> Result<Decoded, StoreError> {
        let bytes = fs::read(&self.path)?;
        Ok(line_format::decode_records(&String::from_utf8_lossy(&bytes)))
    }
}

/// Length of the terminated prefix of `bytes`, or `None` if nothing follows
/// the last terminator.
fn terminated_len(bytes: &[u8]) -> Option<u64> {
    let len = bytes
        .iter()
        .rposition(|&b| b == RECORD_TERMINATOR as u8)
        .map_or(0, |pos| pos + 1);
    (len < bytes.len()).then_some(len as u64)
}
