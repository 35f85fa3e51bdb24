// Keyrs Compose Sequence Model
// Ordered keysym lists and the characters they produce

use std::fmt;

use smallvec::SmallVec;

use crate::symbol::Symbol;

/// Longest sequence the table format can hold
pub const MAX_SEQUENCE_LEN: usize = 5;

/// Highest output codepoint representable in a 16-bit table slot
pub const MAX_OUTPUT_CODEPOINT: u32 = 0xFFFF;

/// The generic compose key; sequences using it are never composed algorithmically
pub const MULTI_KEY: &str = "Multi_key";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("compose sequence has no symbols")]
    Empty,

    #[error("compose sequence has {0} symbols, at most {MAX_SEQUENCE_LEN} are supported")]
    TooLong(usize),
}

/// A compose sequence producing a single character
///
/// The last symbol is the anchor (base character); the others are modifiers
/// whose relative order does not matter for composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeSequence {
    symbols: SmallVec<[Symbol; MAX_SEQUENCE_LEN]>,
    output: u32,
}

impl ComposeSequence {
    pub fn new<I>(symbols: I, output: u32) -> Result<Self, SequenceError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let symbols: SmallVec<[Symbol; MAX_SEQUENCE_LEN]> = symbols.into_iter().collect();
        match symbols.len() {
            0 => Err(SequenceError::Empty),
            n if n > MAX_SEQUENCE_LEN => Err(SequenceError::TooLong(n)),
            _ => Ok(Self { symbols, output }),
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of keystrokes
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Output codepoint
    pub fn output(&self) -> u32 {
        self.output
    }

    pub fn leading(&self) -> &Symbol {
        &self.symbols[0]
    }

    pub fn anchor(&self) -> &Symbol {
        &self.symbols[self.symbols.len() - 1]
    }

    pub fn modifiers(&self) -> &[Symbol] {
        &self.symbols[..self.symbols.len() - 1]
    }

    pub fn uses_multi_key(&self) -> bool {
        self.symbols.iter().any(|s| s.name() == MULTI_KEY)
    }

    pub fn names(&self) -> Vec<&str> {
        self.symbols.iter().map(Symbol::name).collect()
    }
}

impl fmt::Display for ComposeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{} ", symbol)?;
        }
        write!(f, ": U{:04X}", self.output)
    }
}

/// A compose sequence producing two or more characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiOutputRecord {
    pub symbols: Vec<Symbol>,
    pub output: String,
}

impl MultiOutputRecord {
    pub fn codepoints(&self) -> impl Iterator<Item = u32> + '_ {
        self.output.chars().map(u32::from)
    }

    pub fn output_len(&self) -> usize {
        self.output.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, value: u32) -> Symbol {
        Symbol::new(name, value, Some(value))
    }

    #[test]
    fn test_anchor_and_modifiers() {
        let seq = ComposeSequence::new(
            [sym("dead_acute", 0xfe51), sym("dead_grave", 0xfe50), sym("o", 0x6f)],
            0x01a1,
        )
        .unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.leading().name(), "dead_acute");
        assert_eq!(seq.anchor().name(), "o");
        assert_eq!(seq.modifiers().len(), 2);
        assert!(!seq.uses_multi_key());
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(ComposeSequence::new(Vec::new(), 0x41), Err(SequenceError::Empty));
        let six = (0..6).map(|i| sym("a", 0x61 + i));
        assert_eq!(ComposeSequence::new(six, 0x41), Err(SequenceError::TooLong(6)));
    }

    #[test]
    fn test_display() {
        let seq =
            ComposeSequence::new([sym("Multi_key", 0xff20), sym("a", 0x61)], 0xe1).unwrap();
        assert!(seq.uses_multi_key());
        assert_eq!(seq.to_string(), "<Multi_key> <a> : U00E1");
    }
}
