//! Animated line chart of smoothed vaccination rates by political lean.

pub mod animate;
pub mod config;

pub use animate::{frame_windows, render_animation};
pub use config::{ColourScale, RenderConfig};

use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Default animation file name.
pub const DEFAULT_OUTPUT: &str = "T3.gif";

/// Asks the host to display `path` with its default viewer. Never fails:
/// a missing display or viewer is only logged. Call it after
/// [`render_animation`] returns, since the GIF is only complete then.
pub fn show(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        Command::new("xdg-open")
    };

    match command.arg(path).status() {
        Ok(status) if status.success() => info!(path = %path.display(), "Opened animation"),
        Ok(status) => warn!(%status, "No display available, animation was only saved"),
        Err(e) => warn!(error = %e, "No viewer available, animation was only saved"),
    }
}
