use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose spans carry qualification work.
const APP_TARGETS: [&str; 2] = ["btm_qualifier", "btm_qualifier_api"];

/// Level applied to everything else, mainly the HTTP client stack that talks to
/// Google, the Census Bureau and Supabase.
const DEPENDENCY_LEVEL: &str = "warn";

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{value}'")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("unable to install log subscriber: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Installs the global fmt subscriber on stderr so `qualify --json` keeps stdout
/// clean. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// A bare level applies to the app crates only; directive lists pass through.
fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if !LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return level.to_string();
    }

    let mut directives = vec![DEPENDENCY_LEVEL.to_string()];
    directives.extend(APP_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter_directives(level)).map_err(|source| TelemetryError::Filter {
        value: level.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_app_crates() {
        assert_eq!(
            filter_directives("debug"),
            "warn,btm_qualifier=debug,btm_qualifier_api=debug"
        );
        assert_eq!(
            filter_directives(" INFO "),
            "warn,btm_qualifier=INFO,btm_qualifier_api=INFO"
        );
    }

    #[test]
    fn directive_lists_pass_through() {
        assert_eq!(
            filter_directives("info,reqwest=debug"),
            "info,reqwest=debug"
        );
        assert!(build_filter("info,btm_qualifier=trace").is_ok());
    }

    #[test]
    fn rejects_malformed_filter() {
        let err = build_filter("btm_qualifier=[").expect_err("filter rejected");
        assert!(err.to_string().contains("btm_qualifier=["));
    }
}
