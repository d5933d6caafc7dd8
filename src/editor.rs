use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::config::DEFAULT_CONFIG;
use crate::error::{Error, Result};

/// Picks the user's editor: `$EDITOR`, then `$VISUAL`, then the first
/// common editor found on the `PATH`.
pub fn get_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.trim().is_empty() {
                return Ok(editor);
            }
        }
    }

    for fallback in ["sensible-editor", "vim", "vi", "nano"] {
        if Command::new("which")
            .arg(fallback)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
        {
            return Ok(fallback.to_string());
        }
    }

    Err(Error::Editor(
        "No editor found. Set $EDITOR environment variable.".to_string(),
    ))
}

/// Splits an editor setting such as `code --wait` into program and arguments.
fn split_command(editor: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = editor.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Writes the configuration template to `path` unless a file is already there.
/// Returns whether the template was written.
pub fn write_template_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG)?;
    Ok(true)
}

pub fn open_in_editor(path: &Path) -> Result<()> {
    let editor = get_editor()?;
    let (program, args) = split_command(&editor)
        .ok_or_else(|| Error::Editor("Editor setting is empty".to_string()))?;

    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .map_err(|e| Error::Editor(format!("Failed to launch editor '{}': {}", editor, e)))?;

    if !status.success() {
        return Err(Error::Editor(format!(
            "Editor '{}' exited with non-zero status",
            editor
        )));
    }
    Ok(())
}

/// Opens the configuration in the user's editor, seeding it with the
/// template first if it does not exist yet.
pub fn edit_config(path: &Path) -> Result<()> {
    if write_template_if_missing(path)? {
        tracing::info!(path = %path.display(), "wrote configuration template");
    }
    open_in_editor(path)
}
