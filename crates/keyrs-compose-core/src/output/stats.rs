// Keyrs Compose Statistics
// Size accounting for the explicit table and the algorithmic savings

use std::collections::HashSet;
use std::fmt;

use crate::classify::{unique_witnesses, AlgorithmicWitness};
use crate::sequence::{ComposeSequence, MAX_SEQUENCE_LEN};
use crate::table::FLAT_ROW_WIDTH;
use crate::unicode_data::UnicodeStatistics;

/// Bytes per stored table slot
const SLOT_BYTES: usize = 2;

/// Summary of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Explicit plus algorithmic sequences
    pub total: usize,
    pub algorithmic: usize,
    pub explicit: usize,
    /// Explicit sequences starting with or containing `Multi_key`
    pub multi_key: usize,
    pub algorithmic_unique: usize,
    pub algorithmic_greek: usize,
    /// Slots a fixed-width table would need
    pub flat_items: usize,
    /// Padding slots in a fixed-width table
    pub zeroes: usize,
    pub leading_symbols: usize,
    /// Reference figures from UnicodeData.txt, when it was read
    pub unicode: Option<UnicodeStatistics>,
}

impl Statistics {
    pub fn collect(explicit: &[ComposeSequence], algorithmic: &[AlgorithmicWitness]) -> Self {
        let unique = unique_witnesses(algorithmic);
        let leading: HashSet<u32> = explicit.iter().map(|s| s.leading().key_value()).collect();

        Self {
            total: explicit.len() + algorithmic.len(),
            algorithmic: algorithmic.len(),
            explicit: explicit.len(),
            multi_key: explicit.iter().filter(|s| s.uses_multi_key()).count(),
            algorithmic_unique: unique.len(),
            algorithmic_greek: unique.iter().filter(|w| w.is_greek()).count(),
            flat_items: explicit.len() * FLAT_ROW_WIDTH,
            zeroes: explicit.iter().map(|s| MAX_SEQUENCE_LEN - s.len()).sum(),
            leading_symbols: leading.len(),
            unicode: None,
        }
    }

    pub fn flat_bytes(&self) -> usize {
        self.flat_items * SLOT_BYTES
    }

    pub fn zero_percent(&self) -> usize {
        if self.flat_items == 0 {
            0
        } else {
            100 * self.zeroes / self.flat_items
        }
    }

    /// Bytes saved by the compact layout over the fixed-width one
    pub fn savings(&self) -> isize {
        (self.zeroes * SLOT_BYTES) as isize
            - (self.leading_symbols * SLOT_BYTES * MAX_SEQUENCE_LEN) as isize
    }

    pub fn compact_bytes(&self) -> isize {
        self.flat_bytes() as isize - self.savings()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total number of compose sequences (from file)  : {}", self.total)?;
        writeln!(f, "  of which can be expressed algorithmically    : {}", self.algorithmic)?;
        writeln!(f, "  of which cannot be expressed algorithmically : {}", self.explicit)?;
        writeln!(f, "    of which have Multi_key                    : {}", self.multi_key)?;
        writeln!(f)?;
        writeln!(f, "Algorithmic")?;
        writeln!(f, "  sequences                                    : {}", self.algorithmic)?;
        writeln!(f, "  unique                                       : {}", self.algorithmic_unique)?;
        writeln!(f, "  of which are for Greek                       : {}", self.algorithmic_greek)?;
        writeln!(f)?;
        if let Some(unicode) = &self.unicode {
            writeln!(f, "{}", unicode)?;
            writeln!(f)?;
        }
        writeln!(f, "Explicit")?;
        writeln!(f, "  sequences                                    : {}", self.explicit)?;
        writeln!(
            f,
            "  flat array                                   : {} rows of {} integers",
            self.explicit, FLAT_ROW_WIDTH
        )?;
        writeln!(f, "  flat array size in bytes                     : {}", self.flat_bytes())?;
        writeln!(f, "  items in flat array                          : {}", self.flat_items)?;
        writeln!(
            f,
            "    of which are zeroes                        : {} or {} per cent",
            self.zeroes,
            self.zero_percent()
        )?;
        writeln!(f, "  different first items                        : {}", self.leading_symbols)?;
        writeln!(f, "  savings in bytes                             : {}", self.savings())?;
        write!(f, "  compact table size in bytes                  : {}", self.compact_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    fn seq(keys: &[(&str, u32)], output: u32) -> ComposeSequence {
        ComposeSequence::new(
            keys.iter().map(|&(n, k)| Symbol::new(n, k, Some(k))),
            output,
        )
        .unwrap()
    }

    #[test]
    fn test_collect_counts() {
        let explicit = vec![
            seq(&[("dead_acute", 0xfe51), ("dead_grave", 0xfe50), ("o", 0x6f)], 0x1a1),
            seq(&[("Multi_key", 0xff20), ("o", 0x6f), ("c", 0x63)], 0xa9),
            seq(&[("Multi_key", 0xff20), ("a", 0x61), ("e", 0x65)], 0xe6),
        ];
        let witnesses = vec![
            AlgorithmicWitness {
                modifiers: vec![0x301],
                anchor: 0x3b1,
                composed: 'ά',
                declared: 0x3ac,
            },
            AlgorithmicWitness {
                modifiers: vec![0x300],
                anchor: 0x61,
                composed: 'à',
                declared: 0xe0,
            },
        ];

        let stats = Statistics::collect(&explicit, &witnesses);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.multi_key, 2);
        assert_eq!(stats.algorithmic_unique, 2);
        assert_eq!(stats.algorithmic_greek, 1);
        assert_eq!(stats.flat_items, 18);
        assert_eq!(stats.zeroes, 6);
        assert_eq!(stats.zero_percent(), 33);
        assert_eq!(stats.leading_symbols, 2);
        assert_eq!(stats.savings(), 12 - 20);
        assert_eq!(stats.compact_bytes(), 36 + 8);
        assert!(stats.to_string().contains("of which have Multi_key                    : 2"));
    }

    #[test]
    fn test_empty() {
        let stats = Statistics::collect(&[], &[]);
        assert_eq!(stats.zero_percent(), 0);
        assert_eq!(stats.compact_bytes(), 0);
    }

    #[test]
    fn test_unicode_section_rendered_when_present() {
        let mut stats = Statistics::collect(&[], &[]);
        assert!(!stats.to_string().contains("UnicodeData.txt"));

        stats.unicode = Some(UnicodeStatistics {
            entries: 4,
            entries_greek: 1,
            combinations: 5,
            combinations_greek: 1,
        });
        let text = stats.to_string();
        let unicode = text.find("Unicode statistics from UnicodeData.txt").unwrap();
        assert!(text.find("Algorithmic").unwrap() < unicode);
        assert!(unicode < text.find("Explicit").unwrap());
    }
}
