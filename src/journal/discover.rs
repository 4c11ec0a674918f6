use crate::error::MigrateError;
use crate::journal::warn::{self, Stage, WarnEvent};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn warn_skipped(path: &Path, err: &dyn std::fmt::Display) {
    warn::emit(&WarnEvent {
        code: "W010_UNREADABLE",
        stage: Stage::Discover,
        file: &path.display().to_string(),
        reason: "path_skipped",
        err: &err.to_string(),
    });
}

/// Walks `dir` without following symlinked directories. Entries that cannot
/// be read are skipped with a warning.
fn collect_md_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read dir {}", dir.display()))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn_skipped(dir, &err);
                continue;
            }
        };
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                warn_skipped(&path, &err);
                continue;
            }
        };
        if file_type.is_dir() {
            if let Err(err) = collect_md_files(&path, out) {
                warn_skipped(&path, &format!("{err:#}"));
            }
        } else if file_type.is_symlink() && path.is_dir() {
            continue;
        } else if is_markdown(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// True when the lower-cased path contains any of `include`.
pub fn is_journal_path(path: &Path, include: &[String]) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    include
        .iter()
        .any(|needle| lower.contains(&needle.to_lowercase()))
}

/// All journal notes under `root`, sorted by path.
pub fn discover_journal_files(root: &Path, include: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(MigrateError::VaultUnavailable(root.display().to_string()).into());
    }

    let mut files = Vec::new();
    collect_md_files(root, &mut files)?;
    files.retain(|path| is_journal_path(path, include));
    files.sort();
    Ok(files)
}
