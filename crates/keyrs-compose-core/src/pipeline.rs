// Keyrs Compose Pipeline
// Ingest, classify, order, ready for table building

use crate::classify::{AlgorithmicWitness, ClassifyError, ClassifyOptions, Classifier};
use crate::ingest::{IngestError, NormalizeOptions, Normalizer, RawRecord, RecordError, Rejection};
use crate::order::{order_sequences, DedupMode};
use crate::output::Statistics;
use crate::regression::LegacyParseError;
use crate::sequence::{ComposeSequence, MultiOutputRecord};
use crate::symbol::{KeysymTableError, ResolveError, SymbolResolver};
use crate::table::{CompactTable, FlatTable, MultiOutputTable, TableError};

/// Any fatal error of a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("keysym table error: {0}")]
    KeysymTable(#[from] KeysymTableError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("cannot order sequences: {0}")]
    Resolve(#[from] ResolveError),

    #[error("table layout error: {0}")]
    Table(#[from] TableError),

    #[error("legacy sequence list error: {0}")]
    Legacy(#[from] LegacyParseError),
}

/// Policies for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub dedup: DedupMode,
    pub strict_composition: bool,
    pub skip_wide_codepoints: bool,
    /// Log duplicate and disagreement diagnostics as warnings
    pub diagnostics: bool,
}

impl PipelineOptions {
    fn normalize(&self) -> NormalizeOptions {
        NormalizeOptions {
            skip_wide_codepoints: self.skip_wide_codepoints,
            diagnostics: self.diagnostics,
        }
    }

    fn classify(&self) -> ClassifyOptions {
        ClassifyOptions {
            strict_composition: self.strict_composition,
        }
    }
}

/// Result of the main pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Explicit sequences in table order, deduplicated
    pub explicit: Vec<ComposeSequence>,
    /// Witnesses of algorithmic sequences, in input order
    pub algorithmic: Vec<AlgorithmicWitness>,
    /// Multi-character outputs, in input order
    pub multi: Vec<MultiOutputRecord>,
    pub rejected: Vec<Rejection>,
    pub duplicates: usize,
    /// Algorithmic sequences whose composition differs from the declared output
    pub mismatched: usize,
}

impl PipelineOutput {
    pub fn compact_table(&self) -> Result<CompactTable, TableError> {
        CompactTable::build(&self.explicit)
    }

    pub fn multi_table(&self) -> Result<MultiOutputTable, TableError> {
        MultiOutputTable::build(&self.multi)
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::collect(&self.explicit, &self.algorithmic)
    }
}

/// The compose-table generator
pub struct Pipeline<'r> {
    resolver: &'r SymbolResolver,
    options: PipelineOptions,
    classifier: Classifier,
}

impl<'r> Pipeline<'r> {
    pub fn new(resolver: &'r SymbolResolver, options: PipelineOptions) -> Self {
        Self {
            resolver,
            options,
            classifier: Classifier::new(options.classify()),
        }
    }

    pub fn resolver(&self) -> &SymbolResolver {
        self.resolver
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Run the main pipeline over concatenated compose records
    pub fn run(&self, records: &[RawRecord]) -> Result<PipelineOutput, PipelineError> {
        let ingested = Normalizer::new(self.resolver, self.options.normalize()).ingest(records)?;
        let partition = self.classifier.partition(ingested.sequences)?;
        let explicit = order_sequences(partition.explicit, self.options.dedup)?;

        log::info!(
            "{} explicit sequences kept, {} algorithmic, {} multi-output",
            explicit.len(),
            partition.algorithmic.len(),
            ingested.multi.len()
        );

        Ok(PipelineOutput {
            explicit,
            algorithmic: partition.algorithmic,
            multi: ingested.multi,
            rejected: ingested.rejected,
            duplicates: ingested.duplicates,
            mismatched: partition.mismatched,
        })
    }

    /// Ordered sequences for the Win32 table
    ///
    /// No algorithmic reduction; multi-character outputs are ignored.
    pub fn run_win32(&self, records: &[RawRecord]) -> Result<Vec<ComposeSequence>, PipelineError> {
        let ingested = Normalizer::new(self.resolver, self.options.normalize()).ingest(records)?;
        if !ingested.multi.is_empty() {
            log::debug!(
                "ignoring {} multi-output records for the win32 table",
                ingested.multi.len()
            );
        }
        Ok(order_sequences(ingested.sequences, self.options.dedup)?)
    }

    pub fn win32_table(&self, records: &[RawRecord]) -> Result<FlatTable, PipelineError> {
        let sequences = self.run_win32(records)?;
        Ok(FlatTable::build(&sequences)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_records;

    fn resolver() -> SymbolResolver {
        SymbolResolver::from_entries([
            ("dead_acute", 0xfe51, Some(0x301)),
            ("dead_grave", 0xfe50, Some(0x300)),
            ("Multi_key", 0xff20, Some(0xff20)),
            ("a", 0x61, Some(0x61)),
            ("o", 0x6f, Some(0x6f)),
            ("c", 0x63, Some(0x63)),
            ("n", 0x6e, Some(0x6e)),
        ])
    }

    const COMPOSE: &str = "\
<dead_grave> <a> : \"\u{e0}\" U00E0
<dead_acute> <dead_grave> <o> : \"\u{1a1}\" U01A1
<Multi_key> <o> <c> : \"\u{a9}\" U00A9
<Multi_key> <n> <n> : \"nn\"
";

    #[test]
    fn test_run_splits_sequences() {
        let resolver = resolver();
        let records = read_records(COMPOSE, "Compose").unwrap();
        let output = Pipeline::new(&resolver, PipelineOptions::default())
            .run(&records)
            .unwrap();

        assert_eq!(output.algorithmic.len(), 1);
        assert_eq!(output.explicit.len(), 2);
        assert_eq!(output.multi.len(), 1);
        // dead_acute sorts before Multi_key
        assert_eq!(output.explicit[0].output(), 0x1a1);
        assert_eq!(output.explicit[1].output(), 0xa9);
        assert_eq!(output.statistics().total, 3);
    }

    #[test]
    fn test_unknown_symbol_aborts() {
        let resolver = resolver();
        let records = read_records("<dead_ogonek> <a> : \"x\"", "Compose").unwrap();
        let err = Pipeline::new(&resolver, PipelineOptions::default())
            .run(&records)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Ingest(IngestError::Resolve { .. })));
    }

    #[test]
    fn test_win32_keeps_algorithmic() {
        let resolver = resolver();
        let records = read_records(COMPOSE, "win32").unwrap();
        let pipeline = Pipeline::new(&resolver, PipelineOptions::default());
        let sequences = pipeline.run_win32(&records).unwrap();
        assert_eq!(sequences.len(), 3);
        let table = pipeline.win32_table(&records).unwrap();
        assert_eq!(table.rows()[0], [0xfe50, 0x61, 0, 0, 0, 0xe0]);
    }
}
