use std::io;

use tracing_log::LogTracer;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Compact logs to stderr
///
/// `LOG` takes precedence over the default level. `log` records from dependencies (reqwest, roux)
/// are forwarded as well
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("LOG")
        .from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_writer(io::stderr)
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    LogTracer::init()?;

    Ok(())
}
