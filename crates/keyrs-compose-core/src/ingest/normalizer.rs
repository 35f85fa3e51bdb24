// Keyrs Compose Sequence Normalizer
// Applies naming and filtering policies and resolves records into sequences

use std::collections::HashSet;
use std::fmt;

use crate::sequence::{ComposeSequence, MultiOutputRecord, SequenceError, MAX_OUTPUT_CODEPOINT};
use crate::symbol::{is_unicode_literal, parse_literal, ResolveError, Symbol, SymbolResolver};

use super::record::{RawRecord, RecordError};

/// Greek psili and dasia as literal combining marks; they clash with
/// reserved encodings in the consuming table
const RESERVED_MARKERS: &[&str] = &["U0313", "U0314", "0x0313", "0x0314"];

/// Keysym with no Unicode counterpart; its sequences are dropped
const NO_UNICODE_KEYSYM: &str = "dead_currency";

/// Errors that abort ingestion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("line {line} of {source_name}: {error}")]
    Resolve {
        source_name: String,
        line: usize,
        #[source]
        error: ResolveError,
    },

    #[error("line {line} of {source_name}: {error}")]
    Sequence {
        source_name: String,
        line: usize,
        #[source]
        error: SequenceError,
    },

    #[error("line {line} of {source_name}: output U+{codepoint:04X} is above U+FFFF")]
    WideCodepoint {
        source_name: String,
        line: usize,
        codepoint: u32,
    },
}

/// Why a record was left out without failing the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// A keysym beyond the 16-bit key space
    HighPlane { symbol: String, value: u32 },
    /// A reserved literal diacritical marker
    ReservedMarker(String),
    /// A keysym without any Unicode value
    NoUnicodeKeysym,
    /// Output above U+FFFF, skipped by policy
    WideCodepoint(u32),
}

/// A record dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub source_name: String,
    pub line: usize,
    pub symbols: Vec<String>,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = self.symbols.join(" ");
        match &self.reason {
            RejectReason::HighPlane { symbol, value } => {
                write!(f, "Plane1: [{}] ({} = 0x{:X})", symbols, symbol, value)
            }
            RejectReason::ReservedMarker(marker) => {
                write!(f, "Reserved: [{}] ({})", symbols, marker)
            }
            RejectReason::NoUnicodeKeysym => write!(f, "NoUnicode: [{}]", symbols),
            RejectReason::WideCodepoint(cp) => write!(f, "Wide: [{}] (U+{:X})", symbols, cp),
        }
    }
}

/// Normalization policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Skip records whose output is above U+FFFF instead of failing
    pub skip_wide_codepoints: bool,
    /// Log maintainer diagnostics at warn level instead of debug
    pub diagnostics: bool,
}

/// Everything ingestion produced
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Single-output sequences, in input order
    pub sequences: Vec<ComposeSequence>,
    /// Multi-character outputs, in input order
    pub multi: Vec<MultiOutputRecord>,
    pub rejected: Vec<Rejection>,
    /// Repeated symbol lists seen (reported, not removed)
    pub duplicates: usize,
}

/// Rename deprecated `combining_*` keysyms to their `dead_*` spelling
pub fn rename_combining(name: &str) -> String {
    match name.strip_prefix("combining_") {
        Some(rest) => format!("dead_{}", rest),
        None => name.to_string(),
    }
}

fn rejection(record: &RawRecord, names: &[String], reason: RejectReason) -> Rejection {
    Rejection {
        source_name: record.source_name.clone(),
        line: record.line,
        symbols: names.to_vec(),
        reason,
    }
}

/// Turns raw records into resolved sequences
pub struct Normalizer<'r> {
    resolver: &'r SymbolResolver,
    options: NormalizeOptions,
}

impl<'r> Normalizer<'r> {
    pub fn new(resolver: &'r SymbolResolver, options: NormalizeOptions) -> Self {
        Self { resolver, options }
    }

    fn diagnostic(&self, args: fmt::Arguments<'_>) {
        if self.options.diagnostics {
            log::warn!("{}", args);
        } else {
            log::debug!("{}", args);
        }
    }

    /// Normalize every record, routing multi-character outputs aside
    pub fn ingest(&self, records: &[RawRecord]) -> Result<Ingested, IngestError> {
        let mut ingested = Ingested::default();
        let mut seen: HashSet<Vec<String>> = HashSet::new();

        for record in records {
            if record.output.is_multi_char() {
                if let Some(multi) = self.multi_record(record, &mut ingested.rejected)? {
                    ingested.multi.push(multi);
                }
                continue;
            }

            let Some(sequence) = self.single_record(record, &mut ingested.rejected)? else {
                continue;
            };

            let names: Vec<String> = sequence.names().iter().map(|n| n.to_string()).collect();
            if !seen.insert(names) {
                ingested.duplicates += 1;
                self.diagnostic(format_args!(
                    "duplicate sequence at line {} of {}: {}",
                    record.line, record.source_name, sequence
                ));
            }
            ingested.sequences.push(sequence);
        }

        log::debug!(
            "ingested {} sequences, {} multi-output, {} rejected",
            ingested.sequences.len(),
            ingested.multi.len(),
            ingested.rejected.len()
        );
        Ok(ingested)
    }

    /// Rename and screen the keysyms of a record; `Ok(None)` when it is rejected
    ///
    /// Shared by both output paths: `combining_*` names become `dead_*`,
    /// keysyms without Unicode and keysyms beyond 16 bits drop the record.
    fn screen_names(
        &self,
        record: &RawRecord,
        rejected: &mut Vec<Rejection>,
    ) -> Result<Option<Vec<String>>, IngestError> {
        let names: Vec<String> = record.symbols.iter().map(|s| rename_combining(s)).collect();

        if names.iter().any(|n| n == NO_UNICODE_KEYSYM) {
            rejected.push(rejection(record, &names, RejectReason::NoUnicodeKeysym));
            return Ok(None);
        }

        for name in &names {
            let value = self.resolve_key(record, name)?;
            if value > 0xFFFF {
                log::debug!("Plane1: {:?}", names);
                let reason = RejectReason::HighPlane {
                    symbol: name.clone(),
                    value,
                };
                rejected.push(rejection(record, &names, reason));
                return Ok(None);
            }
        }

        Ok(Some(names))
    }

    /// Normalize a single-output record; `Ok(None)` when it is rejected
    pub fn single_record(
        &self,
        record: &RawRecord,
        rejected: &mut Vec<Rejection>,
    ) -> Result<Option<ComposeSequence>, IngestError> {
        let Some(mut names) = self.screen_names(record, rejected)? else {
            return Ok(None);
        };

        let reject = |reason: RejectReason, names: &[String]| rejection(record, names, reason);

        for name in names.iter_mut() {
            if *name == "0x0342" {
                *name = "dead_tilde".to_string();
            }
        }

        if let Some(marker) = names.iter().find(|n| RESERVED_MARKERS.contains(&n.as_str())) {
            rejected.push(reject(RejectReason::ReservedMarker(marker.clone()), &names));
            return Ok(None);
        }

        if is_unicode_literal(&names[0]) {
            let hex = format!("0x{}", &names[0][1..]);
            names[0] = hex;
        }

        let codepoint = self.output_codepoint(record)?;
        if codepoint > MAX_OUTPUT_CODEPOINT {
            if !self.options.skip_wide_codepoints {
                return Err(IngestError::WideCodepoint {
                    source_name: record.source_name.clone(),
                    line: record.line,
                    codepoint,
                });
            }
            log::warn!(
                "skipping line {} of {}: output U+{:X} is above U+FFFF",
                record.line,
                record.source_name,
                codepoint
            );
            rejected.push(reject(RejectReason::WideCodepoint(codepoint), &names));
            return Ok(None);
        }

        let symbols = names
            .iter()
            .map(|name| self.resolve_symbol(record, name))
            .collect::<Result<Vec<_>, _>>()?;

        ComposeSequence::new(symbols, codepoint)
            .map(Some)
            .map_err(|error| IngestError::Sequence {
                source_name: record.source_name.clone(),
                line: record.line,
                error,
            })
    }

    /// Normalize a multi-character record
    ///
    /// Keysyms are screened like single-output ones; literal spellings are
    /// kept as written.
    pub fn multi_record(
        &self,
        record: &RawRecord,
        rejected: &mut Vec<Rejection>,
    ) -> Result<Option<MultiOutputRecord>, IngestError> {
        let Some(names) = self.screen_names(record, rejected)? else {
            return Ok(None);
        };

        if let Some(wide) = record
            .output
            .text
            .chars()
            .map(u32::from)
            .find(|&cp| cp > MAX_OUTPUT_CODEPOINT)
        {
            if !self.options.skip_wide_codepoints {
                return Err(IngestError::WideCodepoint {
                    source_name: record.source_name.clone(),
                    line: record.line,
                    codepoint: wide,
                });
            }
            rejected.push(rejection(record, &names, RejectReason::WideCodepoint(wide)));
            return Ok(None);
        }

        let symbols = names
            .iter()
            .map(|name| self.resolve_symbol(record, name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(MultiOutputRecord {
            symbols,
            output: record.output.text.clone(),
        }))
    }

    /// Output codepoint of a single-output record
    ///
    /// An explicit `Uhhhh` spelling wins, then a keysym name resolved through
    /// the Unicode table, then the first character of the string.
    pub fn output_codepoint(&self, record: &RawRecord) -> Result<u32, IngestError> {
        let Some(spelling) = record.output.codepoint.as_deref() else {
            return Ok(record.output.text.chars().next().map(u32::from).unwrap_or(0));
        };

        if is_unicode_literal(spelling) {
            if let Some(value) = parse_literal(spelling) {
                return Ok(value);
            }
        }

        if let Some((key, unicode)) = self.resolver.value_disagreement(spelling) {
            self.diagnostic(format_args!(
                "DIFFERENCE (nonfatal): 0x{:X} 0x{:X} {:?} {}",
                key, unicode, record.symbols, spelling
            ));
        }

        self.resolver
            .resolve_unicode_value(spelling)
            .map_err(|error| IngestError::Resolve {
                source_name: record.source_name.clone(),
                line: record.line,
                error,
            })
    }

    fn resolve_key(&self, record: &RawRecord, name: &str) -> Result<u32, IngestError> {
        self.resolver
            .resolve_key_value(name)
            .map_err(|error| IngestError::Resolve {
                source_name: record.source_name.clone(),
                line: record.line,
                error,
            })
    }

    fn resolve_symbol(&self, record: &RawRecord, name: &str) -> Result<Symbol, IngestError> {
        self.resolver
            .resolve(name)
            .map_err(|error| IngestError::Resolve {
                source_name: record.source_name.clone(),
                line: record.line,
                error,
            })
    }
}
