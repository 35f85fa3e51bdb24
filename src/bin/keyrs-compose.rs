// Keyrs Compose CLI
// Generates compose tables for input engines from X.Org Compose sources

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, BufWriter, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use keyrs_compose_core::ingest::{read_sources, RawRecord};
#[cfg(feature = "cli")]
use keyrs_compose_core::output::{write_algorithmic, write_compact, write_flat, write_multi};
#[cfg(feature = "cli")]
use keyrs_compose_core::regression::{find_orphans, parse_legacy_sequences};
#[cfg(feature = "cli")]
use keyrs_compose_core::{
    unique_witnesses, Classifier, DedupMode, Pipeline, PipelineOutput, RejectReason, Settings,
    SymbolResolver, UnicodeDatabase, UnicodeStatistics,
};

/// Compose table generator
#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "keyrs-compose")]
#[command(author = "keyrs contributors")]
#[command(version)]
#[command(about = "Generate compact compose tables from X.Org Compose files", long_about = None)]
struct Args {
    #[command(flatten)]
    mode: ModeArgs,

    /// TOML settings file (default: ~/.config/keyrs/compose.toml)
    #[arg(short, long, value_name = "SETTINGS")]
    config: Option<PathBuf>,

    /// Compose source file
    #[arg(long, value_name = "FILE")]
    compose: Option<PathBuf>,

    /// Local override file appended to the compose source
    #[arg(long, value_name = "FILE")]
    lookaside: Option<PathBuf>,

    /// Do not read a lookaside file
    #[arg(long, conflicts_with = "lookaside")]
    no_lookaside: bool,

    /// C header with GDK_ keysym definitions
    #[arg(long, value_name = "FILE")]
    keysyms_header: Option<PathBuf>,

    /// Keysym to Unicode list
    #[arg(long, value_name = "FILE")]
    keysyms_txt: Option<PathBuf>,

    /// Legacy sequence list for --regression
    #[arg(long, value_name = "FILE")]
    legacy_sequences: Option<PathBuf>,

    /// Source file for --win32
    #[arg(long, value_name = "FILE")]
    win32_sequences: Option<PathBuf>,

    /// UnicodeData.txt for --unicodedata and the statistics
    #[arg(long, value_name = "FILE")]
    unicode_data: Option<PathBuf>,

    /// Deduplication mode: flush or legacy
    #[arg(long, value_name = "MODE")]
    dedup: Option<DedupMode>,

    /// Only count a sequence as algorithmic when it composes to its declared output
    #[arg(long)]
    strict_composition: bool,

    /// Skip outputs above U+FFFF instead of failing
    #[arg(long)]
    skip_wide_codepoints: bool,

    /// Report duplicate sequences and keysym value disagreements
    #[arg(short, long)]
    warnings: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

/// What the run emits; at most one may be given
#[cfg(feature = "cli")]
#[derive(clap::Args, Debug)]
#[group(required = false, multiple = false)]
struct ModeArgs {
    /// Emit the compact table
    #[arg(long, visible_alias = "gtk")]
    compact: bool,

    /// Emit the multi-output table
    #[arg(long)]
    multiple: bool,

    /// Emit the Win32 fixed-width table
    #[arg(long)]
    win32: bool,

    /// List the sequences reproduced by canonical composition
    #[arg(long)]
    algorithmic: bool,

    /// List legacy sequences the new table no longer carries
    #[arg(long)]
    regression: bool,

    /// List sequences rejected for keysyms above the 16-bit range
    #[arg(long)]
    plane1: bool,

    /// Print reference statistics from UnicodeData.txt
    #[arg(long)]
    unicodedata: bool,

    /// Print statistics (default)
    #[arg(long)]
    statistics: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Compact,
    Multiple,
    Win32,
    Algorithmic,
    Regression,
    Plane1,
    UnicodeData,
    Statistics,
}

#[cfg(feature = "cli")]
impl ModeArgs {
    fn mode(&self) -> Mode {
        if self.compact {
            Mode::Compact
        } else if self.multiple {
            Mode::Multiple
        } else if self.win32 {
            Mode::Win32
        } else if self.algorithmic {
            Mode::Algorithmic
        } else if self.regression {
            Mode::Regression
        } else if self.plane1 {
            Mode::Plane1
        } else if self.unicodedata {
            Mode::UnicodeData
        } else {
            Mode::Statistics
        }
    }
}

#[cfg(feature = "cli")]
impl Args {
    /// Settings file values with command-line overrides applied
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::load_default().context("loading default settings")?,
        };

        let base = settings.clone();
        let sources = &mut settings.sources;
        sources.compose = base.resolve_path(&sources.compose);
        sources.lookaside = sources.lookaside.as_deref().map(|p| base.resolve_path(p));
        sources.keysyms_header = base.resolve_path(&sources.keysyms_header);
        sources.keysyms_txt = base.resolve_path(&sources.keysyms_txt);
        sources.legacy_sequences = base.resolve_path(&sources.legacy_sequences);
        sources.win32 = base.resolve_path(&sources.win32);
        sources.unicode_data = sources.unicode_data.as_deref().map(|p| base.resolve_path(p));

        if let Some(path) = &self.compose {
            sources.compose = path.clone();
        }
        if let Some(path) = &self.lookaside {
            sources.lookaside = Some(path.clone());
        }
        if self.no_lookaside {
            sources.lookaside = None;
        }
        if let Some(path) = &self.keysyms_header {
            sources.keysyms_header = path.clone();
        }
        if let Some(path) = &self.keysyms_txt {
            sources.keysyms_txt = path.clone();
        }
        if let Some(path) = &self.legacy_sequences {
            sources.legacy_sequences = path.clone();
        }
        if let Some(path) = &self.win32_sequences {
            sources.win32 = path.clone();
        }
        if let Some(path) = &self.unicode_data {
            sources.unicode_data = Some(path.clone());
        }

        let pipeline = &mut settings.pipeline;
        if let Some(dedup) = self.dedup {
            pipeline.dedup = dedup;
        }
        pipeline.strict_composition |= self.strict_composition;
        pipeline.skip_wide_codepoints |= self.skip_wide_codepoints;
        pipeline.diagnostics |= self.warnings;

        Ok(settings)
    }

    fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else if self.quiet {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Warn
        }
    }
}

#[cfg(feature = "cli")]
fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

#[cfg(feature = "cli")]
fn load_resolver(settings: &Settings) -> Result<SymbolResolver> {
    let header_path = &settings.sources.keysyms_header;
    let keysyms_path = &settings.sources.keysyms_txt;
    let header = read_source(header_path)?;
    let keysyms = read_source(keysyms_path)?;

    let header_name = header_path.display().to_string();
    let keysyms_name = keysyms_path.display().to_string();

    let resolver = SymbolResolver::from_reference_files(
        (header.as_str(), header_name.as_str()),
        (keysyms.as_str(), keysyms_name.as_str()),
    )?;
    Ok(resolver)
}

#[cfg(feature = "cli")]
fn read_compose_records(settings: &Settings) -> Result<Vec<RawRecord>> {
    let compose_path = settings.sources.compose.display().to_string();
    let compose = read_source(&settings.sources.compose)?;
    let lookaside = match &settings.sources.lookaside {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => Some((text, path.display().to_string())),
            Err(err) => {
                log::warn!(
                    "did not find the lookaside file {} ({}), continuing",
                    path.display(),
                    err
                );
                None
            }
        },
        None => None,
    };

    let mut sources = vec![(compose.as_str(), compose_path.as_str())];
    if let Some((text, name)) = &lookaside {
        sources.push((text.as_str(), name.as_str()));
    }
    Ok(read_sources(sources)?)
}

#[cfg(feature = "cli")]
fn unicode_statistics(path: &Path, classifier: &Classifier) -> Result<UnicodeStatistics> {
    let text = read_source(path)?;
    let database = UnicodeDatabase::parse(&text, &path.display().to_string())?;
    Ok(UnicodeStatistics::collect(&database, classifier))
}

#[cfg(feature = "cli")]
fn run(args: &Args) -> Result<()> {
    let settings = args.settings()?;
    let mode = args.mode.mode();

    if mode == Mode::UnicodeData {
        let path = settings
            .sources
            .unicode_data
            .as_deref()
            .context("--unicodedata needs --unicode-data or [sources] unicode_data")?;
        let statistics = unicode_statistics(path, &Classifier::default())?;
        println!("{}", statistics);
        return Ok(());
    }

    let resolver = load_resolver(&settings)?;
    let pipeline = Pipeline::new(&resolver, settings.pipeline);
    let compose = || -> Result<PipelineOutput> {
        let records = read_compose_records(&settings)?;
        Ok(pipeline.run(&records)?)
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match mode {
        Mode::Compact => write_compact(&mut out, &compose()?.compact_table()?)?,
        Mode::Multiple => write_multi(&mut out, &compose()?.multi_table()?)?,
        Mode::Win32 => {
            let path = &settings.sources.win32;
            let name = path.display().to_string();
            let text = read_source(path)?;
            let records = read_sources([(text.as_str(), name.as_str())])?;
            write_flat(&mut out, &pipeline.win32_table(&records)?)?;
        }
        Mode::Algorithmic => {
            let output = compose()?;
            write_algorithmic(&mut out, &unique_witnesses(&output.algorithmic))?;
        }
        Mode::Plane1 => {
            for rejection in &compose()?.rejected {
                if matches!(rejection.reason, RejectReason::HighPlane { .. }) {
                    writeln!(out, "{}", rejection)?;
                }
            }
        }
        Mode::Regression => {
            let output = compose()?;
            let path = &settings.sources.legacy_sequences;
            let text = read_source(path)?;
            let legacy = parse_legacy_sequences(&text, &path.display().to_string())?;
            let orphans =
                find_orphans(&legacy, &output.explicit, &resolver, pipeline.classifier())?;
            for orphan in &orphans {
                writeln!(out, "{}", orphan)?;
            }
            writeln!(out, "XCOMM We have {} sequences", orphans.len())?;
        }
        // Handled before the keysym tables are loaded
        Mode::UnicodeData => {}
        Mode::Statistics => {
            let mut statistics = compose()?.statistics();
            if let Some(path) = &settings.sources.unicode_data {
                statistics.unicode = Some(unicode_statistics(path, pipeline.classifier())?);
            }
            writeln!(out, "{}", statistics)?;
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(feature = "cli")]
fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if let Err(err) = run(&args) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

// Stub for when the cli feature is not enabled
#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("Error: keyrs-compose requires the 'cli' feature to be enabled.");
    eprintln!("Please build with: cargo build --release --features cli --bin keyrs-compose");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "cli")]
    use super::*;

    #[test]
    #[cfg(feature = "cli")]
    fn test_args_parsing() {
        let args = Args::parse_from(["keyrs-compose", "--compose", "/tmp/Compose"]);

        assert_eq!(args.compose, Some(PathBuf::from("/tmp/Compose")));
        assert_eq!(args.mode.mode(), Mode::Statistics);
        assert!(!args.verbose);
        assert!(!args.strict_composition);
        assert_eq!(args.dedup, None);
        assert_eq!(args.log_level(), log::LevelFilter::Warn);
    }

    #[test]
    #[cfg(feature = "cli")]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "keyrs-compose",
            "--gtk",
            "--dedup",
            "legacy",
            "--strict-composition",
            "--verbose",
            "--no-lookaside",
        ]);

        assert_eq!(args.mode.mode(), Mode::Compact);
        assert_eq!(args.dedup, Some(DedupMode::Legacy));
        assert!(args.strict_composition);
        assert!(args.no_lookaside);
        assert_eq!(args.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    #[cfg(feature = "cli")]
    fn test_modes_are_exclusive() {
        let result = Args::try_parse_from(["keyrs-compose", "--compact", "--multiple"]);
        assert!(result.is_err());
    }

    #[test]
    #[cfg(feature = "cli")]
    fn test_verbose_conflicts_with_quiet() {
        let result = Args::try_parse_from(["keyrs-compose", "-v", "-q"]);
        assert!(result.is_err());

        let args = Args::parse_from(["keyrs-compose", "--quiet", "--plane1"]);
        assert_eq!(args.log_level(), log::LevelFilter::Error);
        assert_eq!(args.mode.mode(), Mode::Plane1);
    }

    #[test]
    #[cfg(feature = "cli")]
    fn test_unicode_data_flags() {
        let args = Args::parse_from([
            "keyrs-compose",
            "--unicodedata",
            "--unicode-data",
            "/tmp/UnicodeData.txt",
        ]);
        assert_eq!(args.mode.mode(), Mode::UnicodeData);
        assert_eq!(args.unicode_data, Some(PathBuf::from("/tmp/UnicodeData.txt")));

        let result = Args::try_parse_from(["keyrs-compose", "--unicodedata", "--statistics"]);
        assert!(result.is_err());
    }

    #[test]
    #[cfg(feature = "cli")]
    fn test_cli_overrides_settings_file() {
        let dir = std::env::temp_dir().join(format!("keyrs-compose-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("compose.toml");
        fs::write(
            &path,
            "[sources]\ncompose = \"Compose.pre\"\n\n[pipeline]\ndedup = \"legacy\"\n",
        )
        .unwrap();

        let config = path.display().to_string();
        let args = Args::parse_from([
            "keyrs-compose",
            "--config",
            config.as_str(),
            "--dedup",
            "flush",
            "--win32-sequences",
            "/tmp/win32.txt",
        ]);
        let settings = args.settings().unwrap();

        assert_eq!(settings.pipeline.dedup, DedupMode::Flush);
        assert_eq!(settings.sources.compose, dir.join("Compose.pre"));
        assert_eq!(settings.sources.win32, PathBuf::from("/tmp/win32.txt"));
        assert_eq!(settings.sources.unicode_data, None);

        fs::remove_dir_all(&dir).unwrap();
    }
}
