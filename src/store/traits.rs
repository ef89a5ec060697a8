//! Secondary store boundary.
//!
//! The secondary tier is an append-only sequence of `(key, value)` text
//! pairs. The engine decides what to persist and when; stores only move
//! records to and from their medium. Keys and values cross this boundary
//! already rendered as strings so every backend shares one line format
//! (see [`line_format`](crate::store::line_format)).

use crate::error::StoreError;
use crate::store::line_format::Decoded;

/// Append-only persisted key/value pairs.
pub trait SecondaryStore {
    /// Persists one record. The record must be durable (flushed) when this
    /// returns `Ok`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnsupportedRecord`] if the record cannot be encoded.
    /// - [`StoreError::Unavailable`] if the medium cannot be written.
    fn append(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Reads every record, in append order.
    ///
    /// Segments that do not decode are returned in
    /// [`Decoded::malformed`] instead of failing the load.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the medium cannot be read.
    fn load_all(&mut self) -> Result<Decoded, StoreError>;
}

impl<S: SecondaryStore + ?Sized> SecondaryStore for Box<S> {
    fn append(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).append(key, value)
    }

    fn load_all(&mut self) -> Result<Decoded, StoreError> {
        (**self).load_all()
    }
}
