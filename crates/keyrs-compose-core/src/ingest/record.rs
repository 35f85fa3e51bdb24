// Keyrs Compose Record Reader
// Splits Compose-file lines into keysym tokens and an output field

use std::sync::LazyLock;

use regex::Regex;

static SYMBOL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("valid token regex"));

/// Errors for lines that do not form a compose record
///
/// Always fatal; they carry the source name and the 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("invalid line {line} in {source_name}: no sequence/value pair found")]
    MissingSeparator { source_name: String, line: usize },

    #[error("invalid line {line} in {source_name}: no keysyms before ':'")]
    NoSymbols { source_name: String, line: usize },

    #[error("invalid line {line} in {source_name}: no quoted output string")]
    MissingOutput { source_name: String, line: usize },

    #[error("invalid line {line} in {source_name}: unterminated output string")]
    UnterminatedString { source_name: String, line: usize },

    #[error("invalid line {line} in {source_name}: output string is not valid UTF-8")]
    InvalidUtf8 { source_name: String, line: usize },
}

/// The right-hand side of a compose record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputField {
    /// The output string with escapes resolved
    pub text: String,
    /// Whether the quoted literal started with a backslash escape
    pub escaped: bool,
    /// Explicit codepoint spelling after the string (`U00E1` or a keysym name)
    pub codepoint: Option<String>,
}

impl OutputField {
    /// Whether the record belongs on the multi-character path
    pub fn is_multi_char(&self) -> bool {
        !self.escaped && self.text.chars().count() > 1
    }
}

/// One parsed line of a compose source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub source_name: String,
    pub line: usize,
    pub symbols: Vec<String>,
    pub output: OutputField,
}

/// Read every record of a compose source
///
/// Blank lines, `#` comments and `XCOMM` lines are skipped.
pub fn read_records(text: &str, source_name: &str) -> Result<Vec<RawRecord>, RecordError> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(record) = parse_record(line, source_name, index + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parse a single line; `Ok(None)` for lines that carry no record
pub fn parse_record(
    raw: &str,
    source_name: &str,
    line: usize,
) -> Result<Option<RawRecord>, RecordError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("XCOMM") {
        return Ok(None);
    }

    let (keys, value) = trimmed
        .split_once(':')
        .ok_or_else(|| RecordError::MissingSeparator {
            source_name: source_name.to_string(),
            line,
        })?;

    let symbols: Vec<String> = SYMBOL_TOKEN
        .find_iter(keys)
        .map(|m| m.as_str().to_string())
        .collect();
    if symbols.is_empty() {
        return Err(RecordError::NoSymbols {
            source_name: source_name.to_string(),
            line,
        });
    }

    let output = parse_output_field(value.trim(), source_name, line)?;

    Ok(Some(RawRecord {
        source_name: source_name.to_string(),
        line,
        symbols,
        output,
    }))
}

fn parse_output_field(
    value: &str,
    source_name: &str,
    line: usize,
) -> Result<OutputField, RecordError> {
    let body = value
        .strip_prefix('"')
        .ok_or_else(|| RecordError::MissingOutput {
            source_name: source_name.to_string(),
            line,
        })?;

    let escaped = body.starts_with('\\');
    let (bytes, rest) = unescape(body).ok_or_else(|| RecordError::UnterminatedString {
        source_name: source_name.to_string(),
        line,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| RecordError::InvalidUtf8 {
        source_name: source_name.to_string(),
        line,
    })?;
    if text.is_empty() {
        return Err(RecordError::MissingOutput {
            source_name: source_name.to_string(),
            line,
        });
    }

    let codepoint = rest
        .split_whitespace()
        .next()
        .filter(|token| !token.starts_with('#'))
        .map(str::to_string);

    Ok(OutputField {
        text,
        escaped,
        codepoint,
    })
}

/// Resolve the escapes of a quoted string body up to the closing quote
///
/// Octal and hex escapes denote raw bytes, so multi-byte UTF-8 may be spelled
/// out byte by byte. Returns the bytes and the text after the closing quote.
fn unescape(body: &str) -> Option<(Vec<u8>, &str)> {
    let mut bytes = Vec::new();
    let mut chars = body.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '"' => return Some((bytes, &body[pos + 1..])),
            '\\' => {
                let (_, escape) = chars.next()?;
                match escape {
                    'n' => bytes.push(b'\n'),
                    't' => bytes.push(b'\t'),
                    'x' | 'X' => {
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while let Some(&(_, d)) = chars.peek() {
                            match d.to_digit(16) {
                                Some(v) if digits < 2 => {
                                    value = value * 16 + v;
                                    digits += 1;
                                    chars.next();
                                }
                                _ => break,
                            }
                        }
                        bytes.push(value as u8);
                    }
                    '0'..='7' => {
                        let mut value = escape.to_digit(8)?;
                        let mut digits = 1;
                        while let Some(&(_, d)) = chars.peek() {
                            match d.to_digit(8) {
                                Some(v) if digits < 3 => {
                                    value = value * 8 + v;
                                    digits += 1;
                                    chars.next();
                                }
                                _ => break,
                            }
                        }
                        bytes.push((value & 0xff) as u8);
                    }
                    other => {
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
                    }
                }
            }
            other => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_record() {
        let record = parse_record(
            "<dead_acute> <a> : \"á\" aacute # LATIN SMALL LETTER A WITH ACUTE",
            "Compose",
            12,
        )
        .unwrap()
        .unwrap();
        assert_eq!(record.symbols, vec!["dead_acute", "a"]);
        assert_eq!(record.output.text, "á");
        assert_eq!(record.output.codepoint.as_deref(), Some("aacute"));
        assert_eq!(record.line, 12);
        assert!(!record.output.is_multi_char());
    }

    #[test]
    fn test_output_without_codepoint() {
        let record = parse_record("<Multi_key> <o> <c> : \"©\"  # COPYRIGHT", "C", 1)
            .unwrap()
            .unwrap();
        assert_eq!(record.output.codepoint, None);
    }

    #[test]
    fn test_skip_comments_and_blank() {
        assert_eq!(parse_record("", "C", 1).unwrap(), None);
        assert_eq!(parse_record("   # comment", "C", 2).unwrap(), None);
        assert_eq!(parse_record("XCOMM header", "C", 3).unwrap(), None);
    }

    #[test]
    fn test_missing_separator_is_error() {
        let err = parse_record("<dead_acute> <a> \"á\"", "Compose", 7).unwrap_err();
        assert_eq!(
            err,
            RecordError::MissingSeparator {
                source_name: "Compose".to_string(),
                line: 7
            }
        );
    }

    #[test]
    fn test_missing_output_is_error() {
        let err = parse_record("<dead_acute> <a> : aacute", "C", 1).unwrap_err();
        assert!(matches!(err, RecordError::MissingOutput { .. }));
        let err = parse_record("<dead_acute> <a> : \"á", "C", 1).unwrap_err();
        assert!(matches!(err, RecordError::UnterminatedString { .. }));
    }

    #[test]
    fn test_escaped_output() {
        let record = parse_record("<Multi_key> <backslash> <minus> : \"\\\\\" backslash", "C", 1)
            .unwrap()
            .unwrap();
        assert_eq!(record.output.text, "\\");
        assert!(record.output.escaped);

        let record = parse_record("<Multi_key> <quotedbl> <quotedbl> : \"\\\"\" quotedbl", "C", 1)
            .unwrap()
            .unwrap();
        assert_eq!(record.output.text, "\"");
    }

    #[test]
    fn test_octal_utf8_bytes() {
        let record = parse_record("<Multi_key> <C> <equal> : \"\\342\\202\\254\" EuroSign", "C", 1)
            .unwrap()
            .unwrap();
        assert_eq!(record.output.text, "€");
        assert!(record.output.escaped);
        assert!(!record.output.is_multi_char());
    }

    #[test]
    fn test_multi_char_output() {
        let record = parse_record("<dead_macron> <U0306> <a> : \"\u{1fb1}\u{306}\"", "C", 1)
            .unwrap()
            .unwrap();
        assert!(record.output.is_multi_char());
        assert_eq!(record.symbols, vec!["dead_macron", "U0306", "a"]);
    }

    #[test]
    fn test_read_records_line_numbers() {
        let text = "# header\n\n<a> <b> : \"c\"\n<d> <e> : \"f\"\n";
        let records = read_records(text, "Compose").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 3);
        assert_eq!(records[1].line, 4);
    }
}
