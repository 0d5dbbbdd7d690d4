use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `STRATAGEM_LOG=debug`
pub const LOG_ENV: &str = "STRATAGEM_LOG";

/// Send logs to `path` when `STRATAGEM_LOG` is set. The terminal UI owns
/// stdout, so nothing is ever written there. Returns whether logging is on.
pub fn init(path: &Path) -> std::io::Result<bool> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => return Ok(false),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .is_ok();
    Ok(installed)
}
