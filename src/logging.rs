use anyhow::Result;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes logging to stderr, keeping stdout for the discovery output.
///
/// `RUST_LOG` takes precedence. Otherwise this crate logs at `warn`, raised to
/// `info`, `debug` and `trace` by each `verbosity` step; other crates log at `warn`.
pub fn initialize(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env = format!("warn,{}={level}", env!("CARGO_CRATE_NAME"));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env));

    let stderr_subscriber = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_subscriber)
        .try_init()?;

    Ok(())
}
