// Keyrs Compose Unicode Data Statistics
// Counts the precomposed characters canonical composition could produce

use std::fmt;

use indexmap::IndexMap;

use crate::classify::{is_greek_codepoint, Classifier};

/// Fields up to and including the decomposition mapping
const REQUIRED_FIELDS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnicodeDataError {
    #[error("invalid line {line} in {source_name}: expected 6 fields in `{text}`")]
    MissingFields {
        source_name: String,
        line: usize,
        text: String,
    },

    #[error("invalid line {line} in {source_name}: bad codepoint `{text}`")]
    BadCodepoint {
        source_name: String,
        line: usize,
        text: String,
    },
}

/// Decomposition mapping of one character
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decomposition {
    None,
    Canonical(Vec<u32>),
    /// Tagged mapping such as `<compat>` or `<fraction>`
    Compatibility(Vec<u32>),
}

impl Decomposition {
    fn parts(&self) -> &[u32] {
        match self {
            Decomposition::None => &[],
            Decomposition::Canonical(parts) | Decomposition::Compatibility(parts) => parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodeEntry {
    pub name: String,
    pub decomposition: Decomposition,
}

/// Characters of the basic plane keyed by codepoint, in file order
#[derive(Debug, Clone, Default)]
pub struct UnicodeDatabase {
    entries: IndexMap<u32, UnicodeEntry>,
}

/// Plane 1 and the CJK blocks are left out
fn is_skipped(codepoint: u32) -> bool {
    codepoint > 0xFFFF || matches!(codepoint, 0x4E00..=0x9FFF | 0xF900..=0xFAFF)
}

fn parse_hex(text: &str) -> Option<u32> {
    u32::from_str_radix(text, 16).ok()
}

impl UnicodeDatabase {
    /// Parse `UnicodeData.txt`: semicolon-separated fields, decomposition in the sixth
    pub fn parse(text: &str, source_name: &str) -> Result<Self, UnicodeDataError> {
        let mut entries = IndexMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let bad_codepoint = |text: &str| UnicodeDataError::BadCodepoint {
                source_name: source_name.to_string(),
                line: index + 1,
                text: text.to_string(),
            };

            let fields: Vec<&str> = line.split(';').collect();
            if fields.len() < REQUIRED_FIELDS {
                return Err(UnicodeDataError::MissingFields {
                    source_name: source_name.to_string(),
                    line: index + 1,
                    text: line.to_string(),
                });
            }

            let codepoint = parse_hex(fields[0]).ok_or_else(|| bad_codepoint(fields[0]))?;
            if is_skipped(codepoint) {
                continue;
            }

            let mut tokens = fields[5].split_whitespace().peekable();
            let tagged = tokens.next_if(|t| t.starts_with('<') && t.ends_with('>')).is_some();
            let parts = tokens
                .map(|t| parse_hex(t).ok_or_else(|| bad_codepoint(t)))
                .collect::<Result<Vec<_>, _>>()?;

            let decomposition = match (parts.is_empty(), tagged) {
                (true, _) => Decomposition::None,
                (false, false) => Decomposition::Canonical(parts),
                (false, true) => Decomposition::Compatibility(parts),
            };

            entries.insert(
                codepoint,
                UnicodeEntry {
                    name: fields[1].to_string(),
                    decomposition,
                },
            );
        }

        log::debug!("{}: {} characters", source_name, entries.len());
        Ok(Self { entries })
    }

    pub fn get(&self, codepoint: u32) -> Option<&UnicodeEntry> {
        self.entries.get(&codepoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fully decompose a character, following tagged mappings too
    ///
    /// Characters without a mapping, or unknown to the database, stand for
    /// themselves.
    pub fn redecompose(&self, codepoint: u32) -> Vec<u32> {
        let mut out = Vec::new();
        self.redecompose_into(codepoint, &mut out);
        out
    }

    fn redecompose_into(&self, codepoint: u32, out: &mut Vec<u32>) {
        match self.get(codepoint).map(|e| e.decomposition.parts()) {
            Some(parts) if !parts.is_empty() => {
                for &part in parts {
                    self.redecompose_into(part, out);
                }
            }
            _ => out.push(codepoint),
        }
    }
}

fn factorial(n: usize) -> u64 {
    (1..=n as u64).product()
}

/// How much of Unicode canonical composition could produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnicodeStatistics {
    /// Precomposed characters that recompose from their full decomposition
    pub entries: usize,
    pub entries_greek: usize,
    /// Keystroke orderings those characters would need
    pub combinations: u64,
    pub combinations_greek: u64,
}

impl UnicodeStatistics {
    /// Count characters with a canonical mapping whose full decomposition
    /// has at least two parts and composes back to one character
    pub fn collect(database: &UnicodeDatabase, classifier: &Classifier) -> Self {
        let mut stats = Self::default();

        for (&codepoint, entry) in &database.entries {
            let Decomposition::Canonical(parts) = &entry.decomposition else {
                continue;
            };

            let decomposed: Vec<u32> =
                parts.iter().flat_map(|&part| database.redecompose(part)).collect();
            if decomposed.len() < 2 {
                continue;
            }
            let Some(text) = decomposed
                .iter()
                .map(|&cp| char::from_u32(cp))
                .collect::<Option<String>>()
            else {
                continue;
            };
            if single_char(&classifier.normalize(&text)).is_none() {
                continue;
            }

            let orderings = factorial(decomposed.len() - 1);
            stats.entries += 1;
            stats.combinations += orderings;
            if is_greek_codepoint(codepoint) {
                stats.entries_greek += 1;
                stats.combinations_greek += orderings;
            }
        }

        stats
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl fmt::Display for UnicodeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unicode statistics from UnicodeData.txt")?;
        writeln!(f, "  algorithmically producible characters        : {}", self.entries)?;
        writeln!(f, "    of which are for Greek                     : {}", self.entries_greek)?;
        writeln!(f, "  sequence orderings required                  : {}", self.combinations)?;
        writeln!(f, "    of which are for Greek                     : {}", self.combinations_greek)?;
        write!(f, "  partial compositions are not counted")
    }
}
