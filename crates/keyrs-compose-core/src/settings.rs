// Keyrs Compose Settings Module
// Source paths and pipeline policies loaded from a TOML file

#![cfg(feature = "settings")]

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::order::DedupMode;
use crate::pipeline::PipelineOptions;

/// Generator settings
///
/// Loaded from a TOML file (default: ~/.config/keyrs/compose.toml). Every
/// value can be overridden on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub sources: Sources,
    pub pipeline: PipelineOptions,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

/// Input files of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub compose: PathBuf,
    pub lookaside: Option<PathBuf>,
    pub keysyms_header: PathBuf,
    pub keysyms_txt: PathBuf,
    pub legacy_sequences: PathBuf,
    pub win32: PathBuf,
    /// Unicode character database, for reference statistics
    pub unicode_data: Option<PathBuf>,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            compose: PathBuf::from("Compose.pre"),
            lookaside: Some(PathBuf::from("gtk-compose-lookaside.txt")),
            keysyms_header: PathBuf::from("gdkkeysyms.h"),
            keysyms_txt: PathBuf::from("keysyms.txt"),
            legacy_sequences: PathBuf::from("GTKOLDSEQUENCES.txt"),
            win32: PathBuf::from("gtk-win32-sequences.txt"),
            unicode_data: None,
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    sources: Option<SourcesToml>,

    #[serde(default)]
    pipeline: Option<PipelineToml>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SourcesToml {
    compose: Option<PathBuf>,
    lookaside: Option<PathBuf>,
    keysyms_header: Option<PathBuf>,
    keysyms_txt: Option<PathBuf>,
    legacy_sequences: Option<PathBuf>,
    win32: Option<PathBuf>,
    unicode_data: Option<PathBuf>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct PipelineToml {
    dedup: Option<String>,
    strict_composition: Option<toml::Value>,
    skip_wide_codepoints: Option<toml::Value>,
    warnings: Option<toml::Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(sources) = parsed.sources {
            let target = &mut settings.sources;
            if let Some(path) = sources.compose {
                target.compose = path;
            }
            // An empty path disables the lookaside file
            if let Some(path) = sources.lookaside {
                target.lookaside = (!path.as_os_str().is_empty()).then_some(path);
            }
            if let Some(path) = sources.keysyms_header {
                target.keysyms_header = path;
            }
            if let Some(path) = sources.keysyms_txt {
                target.keysyms_txt = path;
            }
            if let Some(path) = sources.legacy_sequences {
                target.legacy_sequences = path;
            }
            if let Some(path) = sources.win32 {
                target.win32 = path;
            }
            if let Some(path) = sources.unicode_data {
                target.unicode_data = (!path.as_os_str().is_empty()).then_some(path);
            }
        }

        if let Some(pipeline) = parsed.pipeline {
            let target = &mut settings.pipeline;
            if let Some(dedup) = pipeline.dedup {
                target.dedup = DedupMode::from_str(&dedup.to_lowercase()).map_err(|_| {
                    SettingsError::InvalidValue(format!(
                        "Unknown dedup mode '{}' (expected 'flush' or 'legacy')",
                        dedup
                    ))
                })?;
            }
            if let Some(value) = pipeline.strict_composition {
                target.strict_composition = parse_bool_value(&value)?;
            }
            if let Some(value) = pipeline.skip_wide_codepoints {
                target.skip_wide_codepoints = parse_bool_value(&value)?;
            }
            if let Some(value) = pipeline.warnings {
                target.diagnostics = parse_bool_value(&value)?;
            }
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keyrs").join("compose.toml"))
    }

    /// Load from default location (~/.config/keyrs/compose.toml)
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Resolve a configured path against the settings file's directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match self.source_path.as_deref().and_then(Path::parent) {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Parse a TOML value as a boolean
fn parse_bool_value(value: &toml::Value) -> Result<bool, SettingsError> {
    match value {
        toml::Value::Boolean(b) => Ok(*b),
        toml::Value::Integer(1) => Ok(true),
        toml::Value::Integer(0) => Ok(false),
        toml::Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(SettingsError::InvalidValue(format!(
                "Cannot convert '{}' to boolean",
                s
            ))),
        },
        _ => Err(SettingsError::InvalidValue(format!(
            "Cannot convert {:?} to boolean",
            value
        ))),
    }
}

/// Default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Keyrs Compose Settings
# Place this file at: ~/.config/keyrs/compose.toml
# Relative paths are resolved against this file's directory.

[sources]
compose = "Compose.pre"
# Set to "" to run without a lookaside file
lookaside = "gtk-compose-lookaside.txt"
keysyms_header = "gdkkeysyms.h"
keysyms_txt = "keysyms.txt"
legacy_sequences = "GTKOLDSEQUENCES.txt"
win32 = "gtk-win32-sequences.txt"
# UnicodeData.txt from unicode.org; adds reference figures to the statistics
unicode_data = ""

[pipeline]
# "flush" keeps every distinct sequence; "legacy" drops the final run
dedup = "flush"
strict_composition = false
skip_wide_codepoints = false
warnings = false
"#
}
