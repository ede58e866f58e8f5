use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Level used by the CLI: debug output when verbose, warnings otherwise.
pub fn cli_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

pub fn init(level: Level) -> Result<()> {
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
    Ok(())
}
