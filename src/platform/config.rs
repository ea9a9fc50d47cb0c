// FaultLens - platform/config.rs
//
// Platform configuration directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for FaultLens configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/faultlens/ or %APPDATA%\FaultLens\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => {
                let config_dir = proj_dirs.config_dir().to_path_buf();
                tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
                Self { config_dir }
            }
            None => {
                tracing::warn!("Could not determine platform directories, using current directory");
                Self {
                    config_dir: PathBuf::from("."),
                }
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads in an
/// older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub retrieval: RetrievalSection,
    pub input: InputSection,
    pub discovery: DiscoverySection,
    pub logging: LoggingSection,
}

/// `[retrieval]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    /// Highest knowledge tier visited.
    pub max_level: Option<u8>,
    /// Token budget per tier.
    pub budget_per_level: Option<usize>,
    /// Snippet count that ends retrieval after the background tiers.
    pub early_stop_count: Option<usize>,
    /// Maximum evidence texts in a report.
    pub evidence_cap: Option<usize>,
}

/// `[input]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// Prefilter keywords; empty disables the prefilter.
    pub keywords: Option<Vec<String>>,
    /// Context lines kept around a keyword hit.
    pub context_lines: Option<usize>,
    /// Line cap per input.
    pub max_lines: Option<usize>,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    pub max_depth: Option<usize>,
    pub max_files: Option<usize>,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

// =============================================================================
// Validated configuration
// =============================================================================

/// Validated application configuration derived from `config.toml`.
///
/// Every value is checked against named constants at load time. Invalid
/// values produce warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    // -- Retrieval --
    pub max_level: u8,
    pub budget_per_level: usize,
    pub early_stop_count: usize,
    pub evidence_cap: usize,

    // -- Input --
    pub keywords: Vec<String>,
    pub context_lines: usize,
    pub max_lines: usize,

    // -- Discovery --
    pub max_depth: usize,
    pub max_files: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_level: constants::MAX_KNOWLEDGE_LEVEL,
            budget_per_level: constants::DEFAULT_BUDGET_PER_LEVEL,
            early_stop_count: constants::DEFAULT_EARLY_STOP_COUNT,
            evidence_cap: constants::DEFAULT_EVIDENCE_CAP,
            keywords: Vec::new(),
            context_lines: constants::DEFAULT_CONTEXT_LINES,
            max_lines: constants::DEFAULT_MAX_LINES,
            max_depth: constants::DEFAULT_MAX_DEPTH,
            max_files: constants::DEFAULT_MAX_FILES,
            include_patterns: to_strings(constants::DEFAULT_INCLUDE_PATTERNS),
            exclude_patterns: to_strings(constants::DEFAULT_EXCLUDE_PATTERNS),
            log_level: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// Loading
// =============================================================================

/// Load config.toml from the platform config directory.
///
/// A missing file is the first-run case and yields defaults with no warnings.
/// An unreadable or unparseable file is reported as a warning and defaults
/// are used, so a broken user config never stops a diagnosis.
pub fn load_default_config(paths: &PlatformPaths) -> (AppConfig, Vec<String>) {
    let path = paths.config_file();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }
    match load_config(&path) {
        Ok(loaded) => loaded,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load and validate an explicitly named config file.
///
/// Unlike `load_default_config`, read and parse failures are errors: the user
/// asked for this file.
pub fn load_config(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_config(&content, path)?;
    tracing::info!(path = %path.display(), warnings = loaded.1.len(), "Loaded config.toml");
    Ok(loaded)
}

/// Parse and validate config.toml content.
///
/// Returns validated values and one warning per rejected value.
pub fn parse_config(content: &str, path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Retrieval --
    if let Some(level) = raw.retrieval.max_level {
        if level <= constants::MAX_KNOWLEDGE_LEVEL {
            config.max_level = level;
        } else {
            warnings.push(format!(
                "[retrieval] max_level = {level} is out of range (0-{}). Using default ({}).",
                constants::MAX_KNOWLEDGE_LEVEL,
                constants::MAX_KNOWLEDGE_LEVEL,
            ));
        }
    }
    validate_range(
        raw.retrieval.budget_per_level,
        (1, constants::ABSOLUTE_MAX_BUDGET_PER_LEVEL),
        "[retrieval] budget_per_level",
        &mut config.budget_per_level,
        &mut warnings,
    );
    validate_range(
        raw.retrieval.early_stop_count,
        (1, constants::ABSOLUTE_MAX_EARLY_STOP_COUNT),
        "[retrieval] early_stop_count",
        &mut config.early_stop_count,
        &mut warnings,
    );
    validate_range(
        raw.retrieval.evidence_cap,
        (1, constants::ABSOLUTE_MAX_EVIDENCE_CAP),
        "[retrieval] evidence_cap",
        &mut config.evidence_cap,
        &mut warnings,
    );

    // -- Input --
    if let Some(keywords) = raw.input.keywords {
        config.keywords = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }
    validate_range(
        raw.input.context_lines,
        (0, constants::ABSOLUTE_MAX_CONTEXT_LINES),
        "[input] context_lines",
        &mut config.context_lines,
        &mut warnings,
    );
    validate_range(
        raw.input.max_lines,
        (1, constants::ABSOLUTE_MAX_LINES),
        "[input] max_lines",
        &mut config.max_lines,
        &mut warnings,
    );

    // -- Discovery --
    validate_range(
        raw.discovery.max_depth,
        (1, constants::ABSOLUTE_MAX_DEPTH),
        "[discovery] max_depth",
        &mut config.max_depth,
        &mut warnings,
    );
    validate_range(
        raw.discovery.max_files,
        (constants::MIN_MAX_FILES, constants::ABSOLUTE_MAX_FILES),
        "[discovery] max_files",
        &mut config.max_files,
        &mut warnings,
    );
    if let Some(patterns) = raw.discovery.include_patterns {
        config.include_patterns = patterns;
    }
    if let Some(patterns) = raw.discovery.exclude_patterns {
        config.exclude_patterns = patterns;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    Ok((config, warnings))
}

/// Accept `value` into `slot` when within `min..=max`, else record a warning.
fn validate_range(
    value: Option<usize>,
    (min, max): (usize, usize),
    key: &str,
    slot: &mut usize,
    warnings: &mut Vec<String>,
) {
    let Some(value) = value else {
        return;
    };
    if (min..=max).contains(&value) {
        *slot = value;
    } else {
        warnings.push(format!(
            "{key} = {value} is out of range ({min}-{max}). Using default ({slot})."
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> (AppConfig, Vec<String>) {
        parse_config(content, Path::new("config.toml")).unwrap()
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let (config, warnings) = parse("");
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_valid_values_accepted() {
        let (config, warnings) = parse(
            r#"
            [retrieval]
            max_level = 2
            budget_per_level = 64
            early_stop_count = 4
            evidence_cap = 20

            [input]
            keywords = ["holdover", "  ", "flap"]
            context_lines = 0
            max_lines = 1000

            [discovery]
            max_depth = 3
            include_patterns = ["*.dotlog"]

            [logging]
            level = "DEBUG"
            "#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.max_level, 2);
        assert_eq!(config.budget_per_level, 64);
        assert_eq!(config.early_stop_count, 4);
        assert_eq!(config.evidence_cap, 20);
        assert_eq!(config.keywords, vec!["holdover", "flap"]);
        assert_eq!(config.context_lines, 0);
        assert_eq!(config.max_lines, 1000);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.include_patterns, vec!["*.dotlog"]);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_values_warn_and_default() {
        let (config, warnings) = parse(
            r#"
            [retrieval]
            max_level = 9
            budget_per_level = 0
            evidence_cap = 1000

            [input]
            context_lines = 500

            [logging]
            level = "loud"
            "#,
        );
        assert_eq!(warnings.len(), 5, "{warnings:?}");
        assert_eq!(config.max_level, constants::MAX_KNOWLEDGE_LEVEL);
        assert_eq!(config.budget_per_level, constants::DEFAULT_BUDGET_PER_LEVEL);
        assert_eq!(config.evidence_cap, constants::DEFAULT_EVIDENCE_CAP);
        assert_eq!(config.context_lines, constants::DEFAULT_CONTEXT_LINES);
        assert!(config.log_level.is_none());
        assert!(warnings[1].contains("budget_per_level = 0"));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let (config, warnings) = parse(include_str!("../../config.example.toml"));
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(
            AppConfig {
                log_level: None,
                ..config
            },
            AppConfig::default()
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (config, warnings) = parse("[future]\nfeature = true\n[retrieval]\nshiny = 1\n");
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let err = parse_config("[retrieval\nmax_level = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_load_config_missing_file_is_error() {
        let err = load_config(Path::new("/nonexistent/faultlens/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_default_config_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PlatformPaths {
            config_dir: dir.path().to_path_buf(),
        };
        let (config, warnings) = load_default_config(&paths);
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());

        std::fs::write(paths.config_file(), "not = [valid").unwrap();
        let (config, warnings) = load_default_config(&paths);
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 1);
    }
}
