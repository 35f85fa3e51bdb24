// Keyrs Compose Canonical Orderer
// Sorts explicit sequences into table order and collapses equivalent ones

use serde::Deserialize;

use crate::sequence::{ComposeSequence, MAX_SEQUENCE_LEN};
use crate::symbol::ResolveError;

/// Fixed-width comparison key: leading value, length, then the remaining
/// values with absent positions set to zero
pub type SequenceKey = [u32; MAX_SEQUENCE_LEN + 1];

/// How the deduplication pass treats the final run of equal sequences
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DedupMode {
    /// Emit one representative for every run, including the last
    #[default]
    Flush,
    /// Never emit the final run, matching tables produced by earlier
    /// generators byte for byte
    Legacy,
}

fn key_from_values(values: &[u32]) -> SequenceKey {
    let mut key = [0u32; MAX_SEQUENCE_LEN + 1];
    key[0] = values[0];
    key[1] = values.len() as u32;
    for (slot, &value) in key[2..].iter_mut().zip(&values[1..]) {
        *slot = value;
    }
    key
}

/// Ordering key over key-identity values
pub fn sequence_key(sequence: &ComposeSequence) -> SequenceKey {
    let values: Vec<u32> = sequence.symbols().iter().map(|s| s.key_value()).collect();
    key_from_values(&values)
}

/// Ordering key over Unicode values, used to spot semantic duplicates
pub fn unicode_key(sequence: &ComposeSequence) -> Result<SequenceKey, ResolveError> {
    let values = sequence
        .symbols()
        .iter()
        .map(|s| s.require_unicode())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(key_from_values(&values))
}

/// Stable sort into table order
pub fn sort_sequences(sequences: &mut [ComposeSequence]) {
    sequences.sort_by_cached_key(sequence_key);
}

/// Collapse adjacent sequences that are equal under the Unicode key
///
/// Each run of equal entries is represented by its last member. Expects
/// input already in table order.
pub fn dedup_sequences(
    sequences: Vec<ComposeSequence>,
    mode: DedupMode,
) -> Result<Vec<ComposeSequence>, ResolveError> {
    let keys = sequences
        .iter()
        .map(unicode_key)
        .collect::<Result<Vec<_>, _>>()?;

    let total = sequences.len();
    let mut unique = Vec::with_capacity(total);
    for (i, sequence) in sequences.into_iter().enumerate() {
        let ends_run = match keys.get(i + 1) {
            Some(next) => *next != keys[i],
            None => mode == DedupMode::Flush,
        };
        if ends_run {
            unique.push(sequence);
        }
    }

    log::debug!("dedup ({}): {} -> {} sequences", mode, total, unique.len());
    Ok(unique)
}

/// Sort then deduplicate
pub fn order_sequences(
    mut sequences: Vec<ComposeSequence>,
    mode: DedupMode,
) -> Result<Vec<ComposeSequence>, ResolveError> {
    sort_sequences(&mut sequences);
    dedup_sequences(sequences, mode)
}
