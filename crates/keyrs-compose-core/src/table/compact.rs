// Keyrs Compose Compact Table
// Two-section offset-indexed layout: a header row per leading keysym,
// then variable-width data rows grouped by sequence length

use smallvec::SmallVec;

use crate::sequence::{ComposeSequence, MAX_SEQUENCE_LEN};

use super::{slot, TableError};

/// Header row width: the leading keysym plus one offset per length bucket
pub const HEADER_WIDTH: usize = MAX_SEQUENCE_LEN + 1;

type DataRow = SmallVec<[u16; MAX_SEQUENCE_LEN + 1]>;

/// Header row for one leading keysym
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub leading: u16,
    /// Offset of the first data row for each length 1..=5
    pub offsets: [u16; MAX_SEQUENCE_LEN],
    /// Number of data rows for each length 1..=5
    pub counts: [usize; MAX_SEQUENCE_LEN],
}

impl HeaderRecord {
    fn to_row(&self) -> [u16; HEADER_WIDTH] {
        let mut row = [0u16; HEADER_WIDTH];
        row[0] = self.leading;
        row[1..].copy_from_slice(&self.offsets);
        row
    }
}

/// The compact compose table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactTable {
    header: Vec<HeaderRecord>,
    data: Vec<DataRow>,
}

impl CompactTable {
    /// Lay out an ordered, deduplicated sequence list
    ///
    /// Sequences sharing a leading keysym must be adjacent and groups must
    /// ascend by leading key value, as produced by the canonical sort.
    pub fn build(sequences: &[ComposeSequence]) -> Result<Self, TableError> {
        // Group runs by leading key value, bucketed by length
        let mut groups: Vec<(u16, [Vec<&ComposeSequence>; MAX_SEQUENCE_LEN])> = Vec::new();
        for sequence in sequences {
            let leading = slot("leading keysym", sequence.leading().key_value())?;
            let bucket = sequence.len() - 1;
            match groups.last_mut() {
                Some((current, buckets)) if *current == leading => buckets[bucket].push(sequence),
                Some((current, _)) if *current > leading => {
                    return Err(TableError::Unordered {
                        previous: *current,
                        next: leading,
                    })
                }
                _ => {
                    let mut buckets: [Vec<&ComposeSequence>; MAX_SEQUENCE_LEN] = Default::default();
                    buckets[bucket].push(sequence);
                    groups.push((leading, buckets));
                }
            }
        }

        let mut header = Vec::with_capacity(groups.len());
        let mut data = Vec::with_capacity(sequences.len());
        let mut cursor = groups.len() * HEADER_WIDTH;

        for (leading, buckets) in &groups {
            let mut record = HeaderRecord {
                leading: *leading,
                offsets: [0; MAX_SEQUENCE_LEN],
                counts: [0; MAX_SEQUENCE_LEN],
            };

            for (bucket, members) in buckets.iter().enumerate() {
                let length = bucket + 1;
                record.offsets[bucket] =
                    u16::try_from(cursor).map_err(|_| TableError::OffsetOverflow(cursor))?;
                record.counts[bucket] = members.len();
                cursor += members.len() * (length + 1);

                for sequence in members {
                    data.push(data_row(sequence)?);
                }
            }

            header.push(record);
        }

        log::debug!(
            "compact table: {} header rows, {} data rows, {} slots",
            header.len(),
            data.len(),
            cursor
        );
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &[HeaderRecord] {
        &self.header
    }

    /// Data rows, each `length + 1` slots wide
    pub fn data_rows(&self) -> impl Iterator<Item = &[u16]> {
        self.data.iter().map(|row| row.as_slice())
    }

    /// Header section as header rows of [`HEADER_WIDTH`] slots
    pub fn header_rows(&self) -> impl Iterator<Item = [u16; HEADER_WIDTH]> + '_ {
        self.header.iter().map(HeaderRecord::to_row)
    }

    pub fn header_flat(&self) -> Vec<u16> {
        self.header_rows().flatten().collect()
    }

    pub fn data_flat(&self) -> Vec<u16> {
        self.data.iter().flatten().copied().collect()
    }

    /// Both sections back to back, as embedded in the consuming engine
    pub fn to_flat(&self) -> Vec<u16> {
        let mut flat = self.header_flat();
        flat.extend(self.data_flat());
        flat
    }

    /// Total number of 16-bit slots
    pub fn len(&self) -> usize {
        self.header.len() * HEADER_WIDTH + self.data.iter().map(|row| row.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Look up a full keysym sequence; returns its output codepoint
    pub fn lookup(&self, keys: &[u16]) -> Option<u16> {
        lookup_flat(&self.to_flat(), self.header.len(), keys)
    }
}

fn data_row(sequence: &ComposeSequence) -> Result<DataRow, TableError> {
    let mut row = DataRow::new();
    for symbol in sequence.symbols() {
        row.push(slot("keysym", symbol.key_value())?);
    }
    row.push(slot("output codepoint", sequence.output())?);
    Ok(row)
}

/// Find a sequence in a flat compact table with `header_rows` header rows
///
/// Binary-searches the header by leading keysym, jumps to the length
/// bucket through its offset and scans that bucket's fixed-stride rows.
pub fn lookup_flat(table: &[u16], header_rows: usize, keys: &[u16]) -> Option<u16> {
    let length = keys.len();
    if length == 0 || length > MAX_SEQUENCE_LEN {
        return None;
    }

    let header = table.get(..header_rows * HEADER_WIDTH)?;
    let row = header
        .chunks_exact(HEADER_WIDTH)
        .collect::<Vec<_>>()
        .binary_search_by_key(&keys[0], |row| row[0])
        .ok()?;

    let base = row * HEADER_WIDTH;
    let start = usize::from(table[base + length]);
    let end = if length < MAX_SEQUENCE_LEN {
        usize::from(table[base + length + 1])
    } else if row + 1 < header_rows {
        usize::from(table[base + HEADER_WIDTH + 1])
    } else {
        table.len()
    };

    table
        .get(start..end)?
        .chunks_exact(length + 1)
        .find(|record| record[..length] == *keys)
        .map(|record| record[length])
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

    fn sample() -> Vec<ComposeSequence> {
        vec![
            seq(&[0xfe50, 0x20], 0x60),
            seq(&[0xfe50, 0xfe51, 0x6f], 0x1dd),
            seq(&[0xfe51, 0x20], 0x27),
            seq(&[0xfe51, 0xfe50, 0x6f], 0x1a1),
            seq(&[0xfe51, 0xfe50, 0x75], 0x1b0),
            seq(&[0xff20, 0x61, 0x65, 0x65, 0x65], 0x1234),
        ]
    }

    #[test]
    fn test_header_offsets() {
        let table = CompactTable::build(&sample()).unwrap();
        let header = table.header();
        assert_eq!(header.len(), 3);

        // Data starts after three header rows of six slots
        assert_eq!(header[0].leading, 0xfe50);
        assert_eq!(header[0].offsets, [18, 18, 21, 25, 25]);
        assert_eq!(header[1].leading, 0xfe51);
        assert_eq!(header[1].offsets, [25, 25, 28, 36, 36]);
        assert_eq!(header[2].leading, 0xff20);
        assert_eq!(header[2].offsets, [36, 36, 36, 36, 36]);
        assert_eq!(table.len(), 42);
    }

    #[test]
    fn test_data_rows_are_unpadded() {
        let table = CompactTable::build(&sample()).unwrap();
        let widths: Vec<usize> = table.data_rows().map(|r| r.len()).collect();
        assert_eq!(widths, vec![3, 4, 3, 4, 4, 6]);
        let first: Vec<u16> = table.data_rows().next().unwrap().to_vec();
        assert_eq!(first, vec![0xfe50, 0x20, 0x60]);
    }

    #[test]
    fn test_bucket_slices_hold_their_sequences() {
        let sequences = sample();
        let table = CompactTable::build(&sequences).unwrap();
        let flat = table.to_flat();

        for record in table.header() {
            for (bucket, &count) in record.counts.iter().enumerate() {
                let length = bucket + 1;
                let start = usize::from(record.offsets[bucket]);
                let slice = &flat[start..start + count * (length + 1)];

                let expected: Vec<u16> = sequences
                    .iter()
                    .filter(|s| s.leading().key_value() == u32::from(record.leading))
                    .filter(|s| s.len() == length)
                    .flat_map(|s| {
                        s.symbols()
                            .iter()
                            .map(|sym| sym.key_value() as u16)
                            .chain([s.output() as u16])
                            .collect::<Vec<_>>()
                    })
                    .collect();
                assert_eq!(slice, expected.as_slice());
            }
        }
    }

    #[test]
    fn test_lookup() {
        let table = CompactTable::build(&sample()).unwrap();
        assert_eq!(table.lookup(&[0xfe51, 0xfe50, 0x6f]), Some(0x1a1));
        assert_eq!(table.lookup(&[0xfe51, 0xfe50, 0x75]), Some(0x1b0));
        assert_eq!(table.lookup(&[0xfe50, 0x20]), Some(0x60));
        assert_eq!(table.lookup(&[0xff20, 0x61, 0x65, 0x65, 0x65]), Some(0x1234));
        assert_eq!(table.lookup(&[0xfe51, 0x61]), None);
        assert_eq!(table.lookup(&[0xfe52, 0x61]), None);
        assert_eq!(table.lookup(&[]), None);
    }

    #[test]
    fn test_unordered_groups_rejected() {
        let sequences = vec![seq(&[0xfe51, 0x61], 1), seq(&[0xfe50, 0x61], 2)];
        assert_eq!(
            CompactTable::build(&sequences),
            Err(TableError::Unordered {
                previous: 0xfe51,
                next: 0xfe50
            })
        );
    }

    #[test]
    fn test_wide_keysym_rejected() {
        let sequences = vec![seq(&[0x1000000, 0x61], 1)];
        assert!(matches!(
            CompactTable::build(&sequences),
            Err(TableError::ValueOverflow { .. })
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = CompactTable::build(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert_eq!(table.lookup(&[0x61]), None);
    }
}
