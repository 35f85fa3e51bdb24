// Keyrs Compose Reducibility Classifier
// Separates sequences that canonical composition reproduces from those
// that must be stored explicitly

use std::cmp::Ordering;

use icu_normalizer::ComposingNormalizer;

use crate::sequence::ComposeSequence;
use crate::symbol::ResolveError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("cannot classify {sequence}: {error}")]
    Unresolved {
        sequence: String,
        #[source]
        error: ResolveError,
    },
}

/// Greek and Coptic or Greek Extended
pub fn is_greek_codepoint(codepoint: u32) -> bool {
    matches!(codepoint, 0x370..=0x3ff | 0x1f00..=0x1fff)
}

/// Proof that a sequence is reproduced by canonical composition
///
/// Only used for reporting; witnesses never enter a stored table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlgorithmicWitness {
    /// Unicode values of the modifiers, in sequence order
    pub modifiers: Vec<u32>,
    /// Unicode value of the anchor
    pub anchor: u32,
    /// The single character composition produced
    pub composed: char,
    /// The output the record declared
    pub declared: u32,
}

impl AlgorithmicWitness {
    /// Whether composition reproduced the declared output exactly
    pub fn matches_declared(&self) -> bool {
        u32::from(self.composed) == self.declared
    }

    /// Number of keystrokes in the witnessed sequence
    pub fn len(&self) -> usize {
        self.modifiers.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the composed character is Greek or extended Greek
    pub fn is_greek(&self) -> bool {
        is_greek_codepoint(u32::from(self.composed))
    }

    /// Ordering by length, then value by value
    pub fn cmp_values(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.modifiers.cmp(&other.modifiers))
            .then_with(|| self.anchor.cmp(&other.anchor))
            .then_with(|| self.composed.cmp(&other.composed))
    }
}

/// Classification verdict for one sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Algorithmic(AlgorithmicWitness),
    Explicit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Require the composed character to equal the declared output
    pub strict_composition: bool,
}

/// Sequences split by classification, each in input order
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub explicit: Vec<ComposeSequence>,
    pub algorithmic: Vec<AlgorithmicWitness>,
    /// Algorithmic sequences whose composition differs from the declared output
    pub mismatched: usize,
}

/// All orderings of `items`, as a fresh list
///
/// Built by inserting the first item into every position of each ordering
/// of the rest. An empty input yields one empty ordering.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let Some((first, rest)) = items.split_first() else {
        return vec![Vec::new()];
    };

    let mut result = Vec::new();
    for perm in permutations(rest) {
        for i in 0..=perm.len() {
            let mut candidate = Vec::with_capacity(perm.len() + 1);
            candidate.extend_from_slice(&perm[..i]);
            candidate.push(first.clone());
            candidate.extend_from_slice(&perm[i..]);
            result.push(candidate);
        }
    }
    result
}

/// Canonical-composition classifier
pub struct Classifier {
    normalizer: ComposingNormalizer,
    options: ClassifyOptions,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifyOptions::default())
    }
}

impl Classifier {
    pub fn new(options: ClassifyOptions) -> Self {
        Self {
            normalizer: ComposingNormalizer::new_nfc(),
            options,
        }
    }

    pub fn options(&self) -> ClassifyOptions {
        self.options
    }

    /// NFC of arbitrary text
    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// NFC of the anchor followed by one ordering of the modifiers
    fn compose_candidate(&self, anchor: char, modifiers: &[char]) -> Option<char> {
        let mut text = String::with_capacity(4 * (modifiers.len() + 1));
        text.push(anchor);
        text.extend(modifiers);

        let normalized = self.normalizer.normalize(&text);
        let mut chars = normalized.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// Compose the anchor with every ordering of the modifiers
    ///
    /// Returns the single characters produced, in permutation order.
    pub fn compositions(&self, anchor: char, modifiers: &[char]) -> Vec<char> {
        permutations(modifiers)
            .iter()
            .filter_map(|perm| self.compose_candidate(anchor, perm))
            .collect()
    }

    /// Whether any ordering of the modifiers composes with the anchor
    pub fn composes(&self, anchor: char, modifiers: &[char]) -> Option<char> {
        permutations(modifiers)
            .iter()
            .find_map(|perm| self.compose_candidate(anchor, perm))
    }

    /// Classify one sequence
    ///
    /// `Multi_key` sequences are always explicit.
    pub fn classify(&self, sequence: &ComposeSequence) -> Result<Classification, ClassifyError> {
        if sequence.uses_multi_key() {
            return Ok(Classification::Explicit);
        }

        let unresolved = |error| ClassifyError::Unresolved {
            sequence: sequence.to_string(),
            error,
        };

        let anchor = sequence.anchor().unicode_char().map_err(unresolved)?;
        let modifier_chars = sequence
            .modifiers()
            .iter()
            .map(|s| s.unicode_char())
            .collect::<Result<Vec<_>, _>>()
            .map_err(unresolved)?;

        let declared = sequence.output();
        let composed = if self.options.strict_composition {
            self.compositions(anchor, &modifier_chars)
                .into_iter()
                .find(|&c| u32::from(c) == declared)
        } else {
            self.composes(anchor, &modifier_chars)
        };

        Ok(match composed {
            Some(composed) => Classification::Algorithmic(AlgorithmicWitness {
                modifiers: modifier_chars.iter().map(|&c| u32::from(c)).collect(),
                anchor: u32::from(anchor),
                composed,
                declared,
            }),
            None => Classification::Explicit,
        })
    }

    /// Classify every sequence; each lands in exactly one side
    pub fn partition(&self, sequences: Vec<ComposeSequence>) -> Result<Partition, ClassifyError> {
        let mut partition = Partition::default();

        for sequence in sequences {
            match self.classify(&sequence)? {
                Classification::Algorithmic(witness) => {
                    if !witness.matches_declared() {
                        partition.mismatched += 1;
                        log::warn!(
                            "{} composes to U+{:04X}, not the declared output",
                            sequence,
                            u32::from(witness.composed)
                        );
                    }
                    log::trace!("algorithmic: {}", sequence);
                    partition.algorithmic.push(witness);
                }
                Classification::Explicit => partition.explicit.push(sequence),
            }
        }

        log::debug!(
            "{} algorithmic, {} explicit sequences",
            partition.algorithmic.len(),
            partition.explicit.len()
        );
        Ok(partition)
    }
}

/// Sort witnesses by length then values and drop repeats
pub fn unique_witnesses(witnesses: &[AlgorithmicWitness]) -> Vec<AlgorithmicWitness> {
    let mut sorted = witnesses.to_vec();
    sorted.sort_by(AlgorithmicWitness::cmp_values);
    sorted.dedup_by(|a, b| a.cmp_values(b).is_eq());
    sorted
}
