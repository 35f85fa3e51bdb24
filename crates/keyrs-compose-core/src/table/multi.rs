// Keyrs Compose Multi-Output Table
// Fixed-width rows for sequences that produce several characters

use crate::sequence::MultiOutputRecord;

use super::{slot, TableError};

/// Zero-padded rows: the sequence columns then the output columns
///
/// Row order follows ingestion order; the row count is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiOutputTable {
    max_sequence_len: usize,
    max_output_len: usize,
    rows: Vec<Vec<u16>>,
}

impl MultiOutputTable {
    pub fn build(records: &[MultiOutputRecord]) -> Result<Self, TableError> {
        let max_sequence_len = records.iter().map(|r| r.symbols.len()).max().unwrap_or(0);
        let max_output_len = records.iter().map(|r| r.output_len()).max().unwrap_or(0);

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut row = Vec::with_capacity(max_sequence_len + max_output_len);
            for symbol in &record.symbols {
                row.push(slot("keysym", symbol.key_value())?);
            }
            row.resize(max_sequence_len, 0);
            for codepoint in record.codepoints() {
                row.push(slot("output codepoint", codepoint)?);
            }
            row.resize(max_sequence_len + max_output_len, 0);
            rows.push(row);
        }

        Ok(Self {
            max_sequence_len,
            max_output_len,
            rows,
        })
    }

    pub fn max_sequence_len(&self) -> usize {
        self.max_sequence_len
    }

    pub fn max_output_len(&self) -> usize {
        self.max_output_len
    }

    pub fn row_width(&self) -> usize {
        self.max_sequence_len + self.max_output_len
    }

    pub fn rows(&self) -> &[Vec<u16>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_flat(&self) -> Vec<u16> {
        self.rows.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    fn record(keys: &[(&str, u32)], output: &str) -> MultiOutputRecord {
        MultiOutputRecord {
            symbols: keys
                .iter()
                .map(|&(name, key)| Symbol::new(name, key, Some(key)))
                .collect(),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_rows_padded_to_global_maxima() {
        let records = vec![
            record(&[("dead_macron", 0xfe54), ("U0306", 0x306), ("a", 0x61)], "\u{1fb1}\u{306}"),
            record(&[("Multi_key", 0xff20), ("n", 0x6e)], "n\u{308}\u{2bc}"),
        ];
        let table = MultiOutputTable::build(&records).unwrap();
        assert_eq!(table.max_sequence_len(), 3);
        assert_eq!(table.max_output_len(), 3);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], vec![0xfe54, 0x306, 0x61, 0x1fb1, 0x306, 0]);
        assert_eq!(table.rows()[1], vec![0xff20, 0x6e, 0, 0x6e, 0x308, 0x2bc]);
        assert_eq!(table.to_flat().len(), 12);
    }

    #[test]
    fn test_single_two_char_record() {
        let table = MultiOutputTable::build(&[record(&[("Multi_key", 0xff20), ("a", 0x61)], "ae")])
            .unwrap();
        assert_eq!(table.rows(), &[vec![0xff20, 0x61, 0x61, 0x65]]);
    }

    #[test]
    fn test_order_follows_input() {
        let records = vec![
            record(&[("z", 0x7a)], "zz"),
            record(&[("a", 0x61)], "aa"),
        ];
        let table = MultiOutputTable::build(&records).unwrap();
        assert_eq!(table.rows()[0][0], 0x7a);
        assert_eq!(table.rows()[1][0], 0x61);
    }

    #[test]
    fn test_empty() {
        let table = MultiOutputTable::build(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.row_width(), 0);
    }
}
