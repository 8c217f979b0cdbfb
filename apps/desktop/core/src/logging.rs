//! Logger setup and runtime level switching.

/// Installs `env_logger` as the `log` backend.
///
/// Respects `RUST_LOG` (default: info). Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
    if result.is_ok() {
        log::debug!("Logger initialized");
    }
}

/// Changes the global log level at runtime (called when the verbose logging setting is toggled).
pub fn set_log_level(level: &str) -> log::LevelFilter {
    let filter = parse_level(level);
    log::set_max_level(filter);
    log::info!("Log level changed to {filter}");
    filter
}

fn parse_level(level: &str) -> log::LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" | "warning" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}
