//! Merging of normalized batches.

use crate::types::CanonicalWeatherRecord;

/// Concatenate normalized batches into one ordered batch.
///
/// Batches are appended in iteration order (the configured source priority); order within each
/// batch is preserved. Nothing is filtered.
pub fn merge<I>(batches: I) -> Vec<CanonicalWeatherRecord>
where
    I: IntoIterator<Item = Vec<CanonicalWeatherRecord>>,
{
    batches.into_iter().flatten().collect()
}
