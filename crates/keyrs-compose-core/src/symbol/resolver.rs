// Keyrs Compose Symbol Resolver
// Maps symbolic key names to key-identity and Unicode values

use std::collections::HashMap;
use std::fmt;

/// Errors raised when a symbol cannot be resolved
///
/// Every one of these is fatal to a generator run: there is no default
/// value for an unrecognized symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown key symbol: {0}")]
    UnknownKeySymbol(String),

    #[error("no Unicode value for symbol: {0}")]
    UnknownUnicodeSymbol(String),

    #[error("symbol {name} maps to U+{value:04X}, which is not a Unicode scalar value")]
    NotAScalar { name: String, value: u32 },
}

/// A resolved key symbol
///
/// Carries the two independent numeric values of a keysym: the key-identity
/// value used for ordering and table encoding, and the Unicode value used
/// for composition testing (absent for keysyms without a character).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    name: String,
    key_value: u32,
    unicode_value: Option<u32>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, key_value: u32, unicode_value: Option<u32>) -> Self {
        Self {
            name: name.into(),
            key_value,
            unicode_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_value(&self) -> u32 {
        self.key_value
    }

    pub fn unicode_value(&self) -> Option<u32> {
        self.unicode_value
    }

    /// Unicode value, failing if the symbol has none
    pub fn require_unicode(&self) -> Result<u32, ResolveError> {
        self.unicode_value
            .ok_or_else(|| ResolveError::UnknownUnicodeSymbol(self.name.clone()))
    }

    /// Unicode value as a `char`, for building composition candidates
    pub fn unicode_char(&self) -> Result<char, ResolveError> {
        let value = self.require_unicode()?;
        char::from_u32(value).ok_or_else(|| ResolveError::NotAScalar {
            name: self.name.clone(),
            value,
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

/// Immutable symbol lookup tables
///
/// Built once from the reference data and passed by reference into every
/// pipeline stage. Tests construct it directly from small synthetic maps.
#[derive(Debug, Clone, Default)]
pub struct SymbolResolver {
    key_values: HashMap<String, u32>,
    unicode_values: HashMap<String, u32>,
}

impl SymbolResolver {
    /// Create a resolver from a key-identity table and a Unicode table
    pub fn new(key_values: HashMap<String, u32>, unicode_values: HashMap<String, u32>) -> Self {
        Self {
            key_values,
            unicode_values,
        }
    }

    /// Build a resolver from `(name, key value, unicode value)` triples
    ///
    /// A `None` Unicode value leaves the name out of the Unicode table.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u32, Option<u32>)>,
    {
        let mut key_values = HashMap::new();
        let mut unicode_values = HashMap::new();
        for (name, key, unicode) in entries {
            key_values.insert(name.to_string(), key);
            if let Some(unicode) = unicode {
                unicode_values.insert(name.to_string(), unicode);
            }
        }
        Self::new(key_values, unicode_values)
    }

    /// Number of names in the key-identity table
    pub fn len(&self) -> usize {
        self.key_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_values.is_empty()
    }

    /// Resolve the key-identity value of a symbol
    ///
    /// Table names take precedence; `Uhhhh` and `0xhhhh` literals resolve
    /// directly to their hexadecimal value.
    pub fn resolve_key_value(&self, name: &str) -> Result<u32, ResolveError> {
        self.key_values
            .get(name)
            .copied()
            .or_else(|| parse_literal(name))
            .ok_or_else(|| ResolveError::UnknownKeySymbol(name.to_string()))
    }

    /// Resolve the Unicode value of a symbol, with the same literal rules
    pub fn resolve_unicode_value(&self, name: &str) -> Result<u32, ResolveError> {
        self.lookup_unicode_value(name)
            .ok_or_else(|| ResolveError::UnknownUnicodeSymbol(name.to_string()))
    }

    /// Unicode value if known, without treating absence as an error
    pub fn lookup_unicode_value(&self, name: &str) -> Option<u32> {
        self.unicode_values
            .get(name)
            .copied()
            .or_else(|| parse_literal(name))
    }

    /// Whether the Unicode table knows this name (literals excluded)
    pub fn has_unicode_entry(&self, name: &str) -> bool {
        self.unicode_values.contains_key(name)
    }

    /// Resolve a symbol name into a [`Symbol`]
    ///
    /// The key-identity value is mandatory; the Unicode value is looked up
    /// but may be absent.
    pub fn resolve(&self, name: &str) -> Result<Symbol, ResolveError> {
        let key_value = self.resolve_key_value(name)?;
        Ok(Symbol::new(name, key_value, self.lookup_unicode_value(name)))
    }

    /// Both table values for a name, when the two tables disagree
    pub fn value_disagreement(&self, name: &str) -> Option<(u32, u32)> {
        match (self.key_values.get(name), self.unicode_values.get(name)) {
            (Some(&key), Some(&unicode)) if key != unicode => Some((key, unicode)),
            _ => None,
        }
    }
}

/// Parse a `Uhhhh` or `0xhhhh` literal symbol
pub fn parse_literal(name: &str) -> Option<u32> {
    let digits = name
        .strip_prefix("0x")
        .or_else(|| name.strip_prefix('U'))?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Whether a name is written as a `Uhhhh` literal
pub fn is_unicode_literal(name: &str) -> bool {
    name.starts_with('U') && parse_literal(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SymbolResolver {
        SymbolResolver::from_entries([
            ("dead_acute", 0xfe51, Some(0x0301)),
            ("a", 0x61, Some(0x61)),
            ("Multi_key", 0xff20, None),
        ])
    }

    #[test]
    fn test_resolve_table_names() {
        let r = resolver();
        assert_eq!(r.resolve_key_value("dead_acute"), Ok(0xfe51));
        assert_eq!(r.resolve_unicode_value("dead_acute"), Ok(0x0301));
        assert_eq!(r.resolve_key_value("a"), Ok(0x61));
    }

    #[test]
    fn test_resolve_literals_without_lookup() {
        let r = resolver();
        assert_eq!(r.resolve_key_value("U00E9"), Ok(0xe9));
        assert_eq!(r.resolve_key_value("0x0342"), Ok(0x342));
        assert_eq!(r.resolve_unicode_value("U1D15E"), Ok(0x1d15e));
    }

    #[test]
    fn test_unknown_symbol_is_error() {
        let r = resolver();
        assert_eq!(
            r.resolve_key_value("dead_nothing"),
            Err(ResolveError::UnknownKeySymbol("dead_nothing".to_string()))
        );
        assert_eq!(
            r.resolve_unicode_value("Multi_key"),
            Err(ResolveError::UnknownUnicodeSymbol("Multi_key".to_string()))
        );
    }

    #[test]
    fn test_names_that_look_hex_prefixed() {
        // "Udiaeresis" starts with U but is not a literal
        assert_eq!(parse_literal("Udiaeresis"), None);
        assert_eq!(parse_literal("U"), None);
        assert_eq!(parse_literal("0x"), None);
        assert!(is_unicode_literal("U0313"));
        assert!(!is_unicode_literal("0x0313"));
    }

    #[test]
    fn test_resolve_symbol_keeps_missing_unicode() {
        let r = resolver();
        let multi = r.resolve("Multi_key").unwrap();
        assert_eq!(multi.key_value(), 0xff20);
        assert_eq!(multi.unicode_value(), None);
        assert!(multi.require_unicode().is_err());
    }

    #[test]
    fn test_value_disagreement() {
        let r = resolver();
        assert_eq!(r.value_disagreement("dead_acute"), Some((0xfe51, 0x0301)));
        assert_eq!(r.value_disagreement("a"), None);
        assert_eq!(r.value_disagreement("Multi_key"), None);
    }
}
