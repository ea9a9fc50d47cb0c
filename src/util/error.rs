// FaultLens - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Per-line parse and classification problems are never errors; they degrade
// into the report data. Only structural misuse and I/O surface here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all FaultLens operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum FaultLensError {
    /// The diagnosis core was asked for something structurally invalid.
    Diagnosis(DiagnosisError),

    /// Log file discovery failed.
    Discovery(DiscoveryError),

    /// Reading an input log failed.
    Input(InputError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for FaultLensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagnosis(e) => write!(f, "Diagnosis error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Input(e) => write!(f, "Input error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for FaultLensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Diagnosis(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Input(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnosis errors
// ---------------------------------------------------------------------------

/// Errors raised by the diagnosis core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisError {
    /// Progressive retrieval was requested for a component that has no
    /// registered skill pack.
    UnknownComponent {
        name: String,
        registered: Vec<String>,
    },
}

impl fmt::Display for DiagnosisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownComponent { name, registered } => {
                let known = if registered.is_empty() {
                    "(none)".to_string()
                } else {
                    registered.join(", ")
                };
                write!(
                    f,
                    "Component '{name}' is not registered. Registered components: {known}"
                )
            }
        }
    }
}

impl std::error::Error for DiagnosisError {}

impl From<DiagnosisError> for FaultLensError {
    fn from(e: DiagnosisError) -> Self {
        Self::Diagnosis(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to log file discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root scan path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Scan path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Scan path '{}' is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<DiscoveryError> for FaultLensError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Errors reading input logs.
#[derive(Debug)]
pub enum InputError {
    /// I/O error while reading a log file.
    Io { path: PathBuf, source: io::Error },

    /// I/O error while reading standard input.
    Stdin { source: io::Error },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
            Self::Stdin { source } => write!(f, "<stdin>: I/O error: {source}"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Stdin { source } => Some(source),
        }
    }
}

impl From<InputError> for FaultLensError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for FaultLensError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for FaultLensError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for FaultLens results.
pub type Result<T> = std::result::Result<T, FaultLensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_component_message_lists_registered() {
        let err = DiagnosisError::UnknownComponent {
            name: "radio".to_string(),
            registered: vec!["clock".to_string(), "switch".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'radio'"));
        assert!(msg.contains("clock, switch"));
    }

    #[test]
    fn test_unknown_component_with_empty_registry() {
        let err = DiagnosisError::UnknownComponent {
            name: "clock".to_string(),
            registered: Vec::new(),
        };
        assert!(err.to_string().contains("(none)"));
    }

    #[test]
    fn test_top_level_wraps_source() {
        use std::error::Error;
        let err: FaultLensError = InputError::Io {
            path: PathBuf::from("missing.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }
        .into();
        assert!(err.to_string().starts_with("Input error:"));
        assert!(err.source().is_some());
    }
}
