// Keyrs Compose Ingest Module
// Reads compose sources and normalizes their records

pub mod normalizer;
pub mod record;

pub use normalizer::{
    rename_combining, IngestError, Ingested, NormalizeOptions, Normalizer, RejectReason, Rejection,
};
pub use record::{parse_record, read_records, OutputField, RawRecord, RecordError};

/// Read several sources in order, the primary first and overrides after
///
/// Line numbers stay relative to each source.
pub fn read_sources<'a, I>(sources: I) -> Result<Vec<RawRecord>, RecordError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut records = Vec::new();
    for (text, source_name) in sources {
        records.extend(read_records(text, source_name)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_records_appended() {
        let primary = "<dead_acute> <a> : \"á\"\n";
        let lookaside = "\n<dead_grave> <a> : \"à\"\n";
        let records = read_sources([(primary, "Compose"), (lookaside, "lookaside")]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_name, "Compose");
        assert_eq!(records[1].source_name, "lookaside");
        assert_eq!(records[1].line, 2);
    }
}
