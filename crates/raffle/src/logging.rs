//! Logging setup.

use tracing::Level;

/// Installs the fmt subscriber at `level`.
///
/// Returns false if a subscriber was already installed.
pub fn init(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}
