// Keyrs Compose Keysym Tables
// Parses the keysym reference files into name -> value tables

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::resolver::SymbolResolver;

static HEX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]+$").expect("valid hex regex"));

/// Errors found while parsing a keysym reference file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeysymTableError {
    #[error("line {line} of {source_name}: expected {expected} fields in `{text}`")]
    MissingFields {
        source_name: String,
        line: usize,
        expected: usize,
        text: String,
    },

    #[error("line {line} of {source_name}: expected a keysym starting with GDK_ in `{text}`")]
    BadName {
        source_name: String,
        line: usize,
        text: String,
    },

    #[error("line {line} of {source_name}: expected a hexadecimal value in `{text}`")]
    BadValue {
        source_name: String,
        line: usize,
        text: String,
    },
}

/// Key-identity values missing from the upstream header
const KEY_VALUE_PATCHES: &[(&str, u32)] = &[
    ("dead_belowdiaeresis", 0x324),
    ("dead_belowring", 0x325),
    ("dead_belowcomma", 0x326),
    ("dead_belowcircumflex", 0x32d),
    ("dead_belowbreve", 0x32e),
    ("dead_belowtilde", 0x330),
    ("dead_belowmacron", 0x331),
    ("VoidSymbol", 0xFFFF),
];

/// Unicode values missing from the upstream keysym list
const UNICODE_VALUE_PATCHES: &[(&str, u32)] = &[
    ("dead_belowdiaeresis", 0x324),
    ("dead_belowring", 0x325),
    ("dead_belowcomma", 0x326),
    ("dead_belowcircumflex", 0x32d),
    ("dead_belowbreve", 0x32e),
    ("dead_belowtilde", 0x330),
    ("dead_belowmacron", 0x331),
    ("zerosubscript", 0x2080),
    ("onesubscript", 0x2081),
    ("twosubscript", 0x2082),
    ("threesubscript", 0x2083),
    ("foursubscript", 0x2084),
    ("fivesubscript", 0x2085),
    ("sixsubscript", 0x2086),
    ("sevensubscript", 0x2087),
    ("eightsubscript", 0x2088),
    ("ninesubscript", 0x2089),
    ("dead_stroke", 0xFE63),
    ("Oslash", 0x0d8),
    ("dead_psili", 0x313),
    ("dead_dasia", 0x314),
    // Lets Multi_key sequences take part in the Unicode comparisons
    ("Multi_key", 0xff20),
];

/// Parse a C keysym header into a key-identity table
///
/// Only `#define GDK_<name> 0x<hex>` lines contribute; every other line is
/// ignored. Zero-valued keysyms are skipped.
pub fn parse_keysym_header(
    text: &str,
    source_name: &str,
) -> Result<HashMap<String, u32>, KeysymTableError> {
    let mut table = HashMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if !line.starts_with("#define GDK_") {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(KeysymTableError::MissingFields {
                source_name: source_name.to_string(),
                line: index + 1,
                expected: 3,
                text: line.to_string(),
            });
        }

        let name = fields[1].strip_prefix("GDK_").ok_or_else(|| KeysymTableError::BadName {
            source_name: source_name.to_string(),
            line: index + 1,
            text: line.to_string(),
        })?;

        let value = fields[2]
            .strip_prefix("0x")
            .filter(|digits| HEX_DIGITS.is_match(digits))
            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
            .ok_or_else(|| KeysymTableError::BadValue {
                source_name: source_name.to_string(),
                line: index + 1,
                text: line.to_string(),
            })?;

        if value == 0 {
            continue;
        }
        table.insert(name.to_string(), value);
    }

    Ok(table)
}

/// Parse a keysym-to-Unicode list into a Unicode table
///
/// Lines look like `0x01a1 U0105 . # aogonek`: the second field holds the
/// Unicode value and the fifth the keysym name. Lines whose second field is
/// not a `U` value, or whose value is zero, are skipped.
pub fn parse_keysyms_txt(
    text: &str,
    source_name: &str,
) -> Result<HashMap<String, u32>, KeysymTableError> {
    let mut table = HashMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(KeysymTableError::MissingFields {
                source_name: source_name.to_string(),
                line: index + 1,
                expected: 5,
                text: line.to_string(),
            });
        }

        let value = fields[1]
            .strip_prefix('U')
            .filter(|digits| HEX_DIGITS.is_match(digits))
            .and_then(|digits| u32::from_str_radix(digits, 16).ok());

        match value {
            Some(0) | None => continue,
            Some(value) => {
                table.insert(fields[4].to_string(), value);
            }
        }
    }

    Ok(table)
}

/// Apply the built-in corrections to freshly parsed tables
pub fn apply_patches(key_values: &mut HashMap<String, u32>, unicode_values: &mut HashMap<String, u32>) {
    for &(name, value) in KEY_VALUE_PATCHES {
        key_values.insert(name.to_string(), value);
    }
    for &(name, value) in UNICODE_VALUE_PATCHES {
        unicode_values.insert(name.to_string(), value);
    }
}

impl SymbolResolver {
    /// Build a resolver from the text of the two keysym reference files
    pub fn from_reference_files(
        header: (&str, &str),
        keysyms_txt: (&str, &str),
    ) -> Result<Self, KeysymTableError> {
        let (header_text, header_name) = header;
        let (keysyms_text, keysyms_name) = keysyms_txt;

        let mut key_values = parse_keysym_header(header_text, header_name)?;
        let mut unicode_values = parse_keysyms_txt(keysyms_text, keysyms_name)?;
        apply_patches(&mut key_values, &mut unicode_values);

        log::debug!(
            "loaded {} key values and {} Unicode values",
            key_values.len(),
            unicode_values.len()
        );
        Ok(Self::new(key_values, unicode_values))
    }
}
