use env_logger::{Builder, Env};

/// Installs the global logger, reading the filter from `RUST_LOG` and
/// falling back to `default_level`. Returns false when a logger was already
/// installed.
pub fn init_logging(default_level: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(false)
        .try_init()
        .is_ok()
}

/// `info`, or `debug` when the command line asked for verbose output.
pub fn level_for(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}
