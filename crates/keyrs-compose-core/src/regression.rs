// Keyrs Compose Regression Pass
// Finds legacy sequences that the regenerated table no longer carries

use std::fmt;

use indexmap::IndexMap;

use crate::classify::Classifier;
use crate::sequence::{ComposeSequence, MAX_SEQUENCE_LEN};
use crate::symbol::{ResolveError, SymbolResolver};

/// Padding marker for unused slots in the legacy list
pub const EMPTY_SLOT: &str = "EMPTY";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacyParseError {
    #[error("invalid line {line} in {source_name}: expected 6 items in `{text}`")]
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

/// A sequence from the legacy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySequence {
    /// Keysym names with the padding removed
    pub symbols: Vec<String>,
    pub codepoint: u32,
}

impl fmt::Display for LegacySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "<{}> ", symbol)?;
        }
        let shown = char::from_u32(self.codepoint).unwrap_or(char::REPLACEMENT_CHARACTER);
        write!(f, "\t\t\t: \"{}\" U{:04X}", shown, self.codepoint)
    }
}

/// Legacy sequences grouped by output codepoint, in file order
pub type LegacyTable = IndexMap<u32, Vec<LegacySequence>>;

/// Parse the legacy list: five keysym slots then a hex codepoint per line
pub fn parse_legacy_sequences(text: &str, source_name: &str) -> Result<LegacyTable, LegacyParseError> {
    let mut table = LegacyTable::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MAX_SEQUENCE_LEN + 1 {
            return Err(LegacyParseError::MissingFields {
                source_name: source_name.to_string(),
                line: index + 1,
                text: line.to_string(),
            });
        }

        let spelled = fields[MAX_SEQUENCE_LEN];
        let digits = spelled.strip_prefix("0x").unwrap_or(spelled);
        let codepoint =
            u32::from_str_radix(digits, 16).map_err(|_| LegacyParseError::BadCodepoint {
                source_name: source_name.to_string(),
                line: index + 1,
                text: spelled.to_string(),
            })?;

        let symbols = fields[..MAX_SEQUENCE_LEN]
            .iter()
            .take_while(|&&s| s != EMPTY_SLOT)
            .map(|s| s.to_string())
            .collect();

        table
            .entry(codepoint)
            .or_default()
            .push(LegacySequence { symbols, codepoint });
    }

    Ok(table)
}

fn same_symbol(resolver: &SymbolResolver, a: &str, b: &str) -> Result<bool, ResolveError> {
    if a == b {
        return Ok(true);
    }
    Ok(resolver.resolve_key_value(a)? == resolver.resolve_key_value(b)?)
}

fn matches(
    resolver: &SymbolResolver,
    sequence: &ComposeSequence,
    legacy: &LegacySequence,
) -> Result<bool, ResolveError> {
    if sequence.len() != legacy.symbols.len() {
        return Ok(false);
    }
    for (symbol, name) in sequence.symbols().iter().zip(&legacy.symbols) {
        if !same_symbol(resolver, symbol.name(), name)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether a legacy sequence is reproduced by canonical composition
fn is_composed(
    resolver: &SymbolResolver,
    classifier: &Classifier,
    legacy: &LegacySequence,
) -> Result<bool, ResolveError> {
    let Some((anchor, modifiers)) = legacy.symbols.split_last() else {
        return Ok(false);
    };
    if modifiers.is_empty() {
        return Ok(false);
    }

    let anchor = resolver.resolve(anchor)?.unicode_char()?;
    let modifiers = modifiers
        .iter()
        .map(|name| resolver.resolve(name).and_then(|s| s.unicode_char()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(classifier.composes(anchor, &modifiers).is_some())
}

/// Legacy sequences matched by no explicit sequence and not composable
///
/// Each explicit sequence claims at most one legacy entry with the same
/// output; keysyms match by name or by key value.
pub fn find_orphans<'a>(
    legacy: &'a LegacyTable,
    explicit: &[ComposeSequence],
    resolver: &SymbolResolver,
    classifier: &Classifier,
) -> Result<Vec<&'a LegacySequence>, ResolveError> {
    let mut matched: IndexMap<u32, Vec<bool>> = legacy
        .iter()
        .map(|(&cp, entries)| (cp, vec![false; entries.len()]))
        .collect();

    for sequence in explicit {
        let Some(entries) = legacy.get(&sequence.output()) else {
            continue;
        };
        let flags = &mut matched[&sequence.output()];
        for (i, entry) in entries.iter().enumerate() {
            if !flags[i] && matches(resolver, sequence, entry)? {
                flags[i] = true;
                break;
            }
        }
    }

    let mut orphans = Vec::new();
    for (cp, entries) in legacy {
        for (entry, &was_matched) in entries.iter().zip(&matched[cp]) {
            if !was_matched && !is_composed(resolver, classifier, entry)? {
                orphans.push(entry);
            }
        }
    }

    log::debug!("{} legacy sequences without a counterpart", orphans.len());
    Ok(orphans)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = "\
dead_acute a EMPTY EMPTY EMPTY 00E1
dead_acute dead_grave o EMPTY EMPTY 01A1
Multi_key o c EMPTY EMPTY 00A9
Multi_key c o EMPTY EMPTY 00A9
";

    fn resolver() -> SymbolResolver {
        SymbolResolver::from_entries([
            ("dead_acute", 0xfe51, Some(0x301)),
            ("dead_grave", 0xfe50, Some(0x300)),
            ("Multi_key", 0xff20, Some(0xff20)),
            ("a", 0x61, Some(0x61)),
            ("o", 0x6f, Some(0x6f)),
            ("c", 0x63, Some(0x63)),
        ])
    }

    #[test]
    fn test_parse_groups_by_codepoint() {
        let table = parse_legacy_sequences(LEGACY, "legacy").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[&0xa9].len(), 2);
        assert_eq!(table[&0xe1][0].symbols, vec!["dead_acute", "a"]);
        // File order is kept
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![0xe1, 0x1a1, 0xa9]);
    }

    #[test]
    fn test_parse_short_line_is_error() {
        let err = parse_legacy_sequences("dead_acute a 00E1", "legacy").unwrap_err();
        assert!(matches!(err, LegacyParseError::MissingFields { line: 1, .. }));
    }

    #[test]
    fn test_orphans() {
        let resolver = resolver();
        let classifier = Classifier::default();
        let legacy = parse_legacy_sequences(LEGACY, "legacy").unwrap();
        let explicit = vec![ComposeSequence::new(
            ["Multi_key", "o", "c"].iter().map(|n| resolver.resolve(n).unwrap()),
            0xa9,
        )
        .unwrap()];

        let orphans = find_orphans(&legacy, &explicit, &resolver, &classifier).unwrap();
        // dead_acute a composes; Multi_key o c is matched
        assert_eq!(orphans.len(), 2);
        assert_eq!(orphans[0].codepoint, 0x1a1);
        assert_eq!(orphans[1].symbols, vec!["Multi_key", "c", "o"]);
        assert!(orphans[1].to_string().starts_with("<Multi_key> <c> <o> "));
        assert!(orphans[1].to_string().ends_with(": \"©\" U00A9"));
    }
}
