use tracing_subscriber::EnvFilter;

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` over `info`.
/// `json` switches to one JSON object per event.
pub fn init(verbose: bool, json: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
