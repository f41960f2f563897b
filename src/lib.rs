pub mod api;
pub mod core;
pub mod race;

/// Installs the global logger. `verbosity` 0 shows warnings, each step up
/// adds a level; `RUST_LOG` takes precedence when set.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
