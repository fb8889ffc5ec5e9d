//! Batch validation and chunking.

use std::{num::NonZeroUsize, slice::Chunks};

use serde_json::Value;

use crate::error::ClientError;

use super::payload::{Payload, value_kind};

/// Split `items` into ordered chunks of at most `batch_size` elements.
///
/// With no batch size the whole slice forms a single chunk. The final chunk
/// may be shorter than the others.
pub fn chunks<T>(
    items: &[T],
    batch_size: Option<NonZeroUsize>,
) -> Result<Chunks<'_, T>, ClientError> {
    if items.is_empty() {
        return Err(ClientError::InvalidBatch("empty batch".into()));
    }
    let size = batch_size.map_or(items.len(), NonZeroUsize::get);
    Ok(items.chunks(size))
}

/// Interpret an untyped JSON value as a batch of payloads.
///
/// Only arrays are batches. Each element is converted independently, and the
/// first element that fails conversion aborts the whole batch.
pub fn payloads_from_value(value: Value) -> Result<Vec<Payload>, ClientError> {
    match value {
        Value::Array(items) => items.into_iter().map(Payload::try_from).collect(),
        other => {
            log::debug!("rejecting {} passed as a batch", value_kind(&other));
            Err(ClientError::InvalidBatch("must be an array".into()))
        }
    }
}
