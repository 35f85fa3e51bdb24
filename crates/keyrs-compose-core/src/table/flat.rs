// Keyrs Compose Flat Table
// Fixed-width rows for consumers that scan linearly (the Win32 variant)

use crate::sequence::{ComposeSequence, MAX_SEQUENCE_LEN};

use super::{slot, TableError};

/// Five keysym slots plus the output codepoint
pub const FLAT_ROW_WIDTH: usize = MAX_SEQUENCE_LEN + 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTable {
    rows: Vec<[u16; FLAT_ROW_WIDTH]>,
}

impl FlatTable {
    /// One zero-padded row per sequence, in the given order
    pub fn build(sequences: &[ComposeSequence]) -> Result<Self, TableError> {
        let mut rows = Vec::with_capacity(sequences.len());
        for sequence in sequences {
            let mut row = [0u16; FLAT_ROW_WIDTH];
            for (slot_value, symbol) in row.iter_mut().zip(sequence.symbols()) {
                *slot_value = slot("keysym", symbol.key_value())?;
            }
            row[MAX_SEQUENCE_LEN] = slot("output codepoint", sequence.output())?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[[u16; FLAT_ROW_WIDTH]] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Linear scan for a full keysym sequence
    pub fn lookup(&self, keys: &[u16]) -> Option<u16> {
        if keys.is_empty() || keys.len() > MAX_SEQUENCE_LEN {
            return None;
        }
        self.rows
            .iter()
            .find(|row| {
                row[..keys.len()] == *keys && row[keys.len()..MAX_SEQUENCE_LEN].iter().all(|&k| k == 0)
            })
            .map(|row| row[MAX_SEQUENCE_LEN])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    fn seq(keys: &[u32], output: u32) -> ComposeSequence {
        ComposeSequence::new(
            keys.iter().map(|&k| Symbol::new(format!("k{:x}", k), k, Some(k))),
            output,
        )
        .unwrap()
    }

    #[test]
    fn test_rows_are_fixed_width() {
        let table = FlatTable::build(&[
            seq(&[0xfe51, 0x61], 0xe1),
            seq(&[0xff20, 0x61, 0x62, 0x63, 0x64], 0x1234),
        ])
        .unwrap();
        assert_eq!(table.rows()[0], [0xfe51, 0x61, 0, 0, 0, 0xe1]);
        assert_eq!(table.rows()[1], [0xff20, 0x61, 0x62, 0x63, 0x64, 0x1234]);
    }

    #[test]
    fn test_lookup_matches_whole_sequence() {
        let table = FlatTable::build(&[seq(&[0xfe51, 0x61], 0xe1), seq(&[0xfe51], 0xb4)]).unwrap();
        assert_eq!(table.lookup(&[0xfe51, 0x61]), Some(0xe1));
        assert_eq!(table.lookup(&[0xfe51]), Some(0xb4));
        assert_eq!(table.lookup(&[0xfe51, 0x62]), None);
    }
}
