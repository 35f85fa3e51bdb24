// Keyrs Compose Table Module
// Encodes ordered sequences into the 16-bit arrays consumed by input engines

pub mod compact;
pub mod flat;
pub mod multi;

pub use compact::{CompactTable, HeaderRecord, HEADER_WIDTH};
pub use flat::{FlatTable, FLAT_ROW_WIDTH};
pub use multi::MultiOutputTable;

/// Errors raised while laying out a table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("{what} 0x{value:X} does not fit in a 16-bit table slot")]
    ValueOverflow { what: &'static str, value: u32 },

    #[error("data offset {0} does not fit in a 16-bit table slot")]
    OffsetOverflow(usize),

    #[error("leading keysym 0x{next:04X} follows 0x{previous:04X}; sequences are not in table order")]
    Unordered { previous: u16, next: u16 },
}

/// Narrow a value to a table slot
pub(crate) fn slot(what: &'static str, value: u32) -> Result<u16, TableError> {
    u16::try_from(value).map_err(|_| TableError::ValueOverflow { what, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_bounds() {
        assert_eq!(slot("keysym", 0xFFFF), Ok(0xFFFF));
        assert_eq!(
            slot("keysym", 0x10000),
            Err(TableError::ValueOverflow {
                what: "keysym",
                value: 0x10000
            })
        );
    }
}
