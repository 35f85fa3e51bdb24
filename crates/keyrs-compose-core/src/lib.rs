// Keyrs Compose Core Library
// Compose-sequence reduction and compact table generation

pub mod classify;
pub mod ingest;
pub mod order;
pub mod output;
pub mod pipeline;
pub mod regression;
pub mod sequence;
pub mod symbol;
pub mod table;
pub mod unicode_data;

#[cfg(feature = "settings")]
pub mod settings;

pub use classify::{
    is_greek_codepoint, permutations, unique_witnesses, AlgorithmicWitness, Classification, ClassifyError,
    ClassifyOptions, Classifier, Partition,
};
pub use ingest::{
    read_records, read_sources, IngestError, Ingested, NormalizeOptions, Normalizer, RawRecord,
    RecordError, RejectReason, Rejection,
};
pub use order::{
    dedup_sequences, order_sequences, sequence_key, sort_sequences, unicode_key, DedupMode,
    SequenceKey,
};
pub use output::{write_algorithmic, write_compact, write_flat, write_multi, Statistics};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineOutput};
pub use regression::{find_orphans, parse_legacy_sequences, LegacyParseError, LegacySequence, LegacyTable};
pub use sequence::{ComposeSequence, MultiOutputRecord, SequenceError, MAX_SEQUENCE_LEN};
pub use symbol::{
    parse_keysym_header, parse_keysyms_txt, KeysymTableError, ResolveError, Symbol,
    SymbolResolver,
};
pub use table::{CompactTable, FlatTable, HeaderRecord, MultiOutputTable, TableError};
pub use unicode_data::{Decomposition, UnicodeDataError, UnicodeDatabase, UnicodeEntry, UnicodeStatistics};

#[cfg(feature = "settings")]
pub use settings::{Settings, SettingsError, Sources};
