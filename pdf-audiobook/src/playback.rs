//! Open finished audiobooks with the system's default player.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Command line that opens `path` with the default application.
fn open_command(path: &Path) -> (&'static str, Vec<String>) {
    let target = path.display().to_string();
    if cfg!(target_os = "windows") {
        ("cmd", vec!["/C".into(), "start".into(), String::new(), target])
    } else if cfg!(target_os = "macos") {
        ("open", vec![target])
    } else {
        ("xdg-open", vec![target])
    }
}

/// Hand `path` to the default player without waiting for playback.
pub fn play(path: &Path) -> Result<()> {
    let (program, args) = open_command(path);
    Command::new(program)
        .args(&args)
        .spawn()
        .with_context(|| format!("Failed to run {} for {}", program, path.display()))?;
    Ok(())
}

/// Play every path, logging failures instead of returning them.
pub fn play_all<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        log::info!("playing {}", path.display());
        if let Err(e) = play(path) {
            log::warn!("{:#}", e);
        }
    }
}
