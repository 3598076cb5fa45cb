use anyhow::Result;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing_log::AsTrace;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Routes tracing output to stderr, filtered by the `-v`/`-q` flags and
/// overridable via `RUST_LOG`. Stdout is reserved for file contents.
pub(crate) fn configure_tracing(verbose: Verbosity<InfoLevel>) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(verbose.log_level_filter().as_trace().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
