use crate::cli::Verbosity;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Issues are printed by the commands themselves, so the library target stays quiet unless
/// asked for.
fn default_directives(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error,joinplan=off",
        Verbosity::Normal => "warn,joinplan=off",
        Verbosity::Verbose => "info,joinplan=debug",
    }
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over the verbosity flags.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
