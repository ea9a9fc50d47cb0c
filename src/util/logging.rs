// FaultLens - util/logging.rs
//
// tracing subscriber setup. Reports go to stdout, so every log line goes to
// stderr. The filter comes from the first of: RUST_LOG, --debug, the
// `[logging] level` config key, "info".

use tracing_subscriber::EnvFilter;

/// Where the active filter directive came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSource {
    Env,
    DebugFlag,
    Config(String),
    Default,
}

fn filter_source(env_set: bool, debug_flag: bool, config_level: Option<&str>) -> FilterSource {
    match (env_set, debug_flag, config_level) {
        (true, _, _) => FilterSource::Env,
        (false, true, _) => FilterSource::DebugFlag,
        (false, false, Some(level)) => FilterSource::Config(level.to_string()),
        (false, false, None) => FilterSource::Default,
    }
}

/// Install the global subscriber. Later calls are no-ops.
///
/// A config level that is not a valid filter directive falls back to the
/// default level with a warning instead of aborting startup.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let source = filter_source(std::env::var_os("RUST_LOG").is_some(), debug_flag, config_level);
    let mut rejected = None;
    let filter = match &source {
        FilterSource::Env => EnvFilter::from_default_env(),
        FilterSource::DebugFlag => EnvFilter::new("debug"),
        FilterSource::Config(level) => EnvFilter::try_new(level).unwrap_or_else(|e| {
            rejected = Some(e.to_string());
            EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
        }),
        FilterSource::Default => EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .try_init();

    if let Some(error) = rejected {
        tracing::warn!(level = ?config_level, error = %error, "Invalid [logging] level, using default");
    }
    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        source = ?source,
        "Logging initialised"
    );
}

/// Truncate a raw log line for inclusion in debug output.
pub fn preview(line: &str) -> &str {
    let max = super::constants::DEBUG_MAX_LINE_PREVIEW;
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
