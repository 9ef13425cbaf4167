//! Splitting a submission's item IDs into fixed-size batches

/// Largest batch the dispatcher accepts
pub const MAX_BATCH_SIZE: usize = 3;

/// Default number of items per batch
pub const DEFAULT_BATCH_SIZE: usize = MAX_BATCH_SIZE;

/// Split `ids` into consecutive chunks of at most `batch_size` items
///
/// Order is preserved and no item is dropped or duplicated; only the last
/// chunk may be short. `batch_size` is clamped to `1..=MAX_BATCH_SIZE`.
pub fn split_into_batches(ids: &[u64], batch_size: usize) -> Vec<Vec<u64>> {
    ids.chunks(batch_size.clamp(1, MAX_BATCH_SIZE)).map(<[u64]>::to_vec).collect()
}
