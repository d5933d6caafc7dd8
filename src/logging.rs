use tracing_subscriber::EnvFilter;

/// Filter used when neither `--debug` nor `RUST_LOG` asks for more.
const DEFAULT_FILTER: &str = "warn";

/// Filter used with `--debug`: every request and response of this crate.
const DEBUG_FILTER: &str = "warn,marketoctl=debug";

/// Installs the global subscriber. Logs go to stderr so that records
/// printed on stdout stay clean. `RUST_LOG` takes precedence.
pub fn init(debug: bool) {
    let fallback = if debug { DEBUG_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Ignore a second initialisation rather than failing the command.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
