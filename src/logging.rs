//! tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directive: `RUST_LOG`, then `--verbose`, then the config
/// file, then [`DEFAULT_FILTER`].
pub fn filter_directive(
    rust_log: Option<&str>,
    verbose: bool,
    config_filter: Option<&str>,
) -> String {
    let non_blank = |s: &&str| !s.trim().is_empty();
    if let Some(env) = rust_log.filter(non_blank) {
        return env.to_string();
    }
    if verbose {
        return "promptly=debug,info".to_string();
    }
    config_filter
        .filter(non_blank)
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the global subscriber, writing to stderr.
pub fn init(verbose: bool, config_filter: Option<&str>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(rust_log.as_deref(), verbose, config_filter);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins() {
        assert_eq!(filter_directive(Some("trace"), true, Some("info")), "trace");
    }

    #[test]
    fn verbose_before_config() {
        assert_eq!(
            filter_directive(None, true, Some("info")),
            "promptly=debug,info"
        );
    }

    #[test]
    fn config_then_default() {
        assert_eq!(filter_directive(None, false, Some("info")), "info");
        assert_eq!(filter_directive(None, false, None), DEFAULT_FILTER);
        assert_eq!(filter_directive(Some(" "), false, Some("")), DEFAULT_FILTER);
    }
}
