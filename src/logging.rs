use log::LevelFilter;

/// Installs `env_logger`. Debug mode logs everything this crate does,
/// otherwise only warnings and errors; `RUST_LOG` still wins.
pub fn init(debug_mode: bool) {
    let level = if debug_mode {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let _ = env_logger::Builder::new()
        .filter_module(env!("CARGO_CRATE_NAME"), level)
        .parse_default_env()
        .try_init();
}
