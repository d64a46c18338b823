use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::Local;
use log::warn;

use crate::persist::PersistError;

/// Copy `file` into `backup_dir` under a timestamped name, then prune old
/// backups of the same file down to `retain`.
///
/// A missing `file` is not an error; there is nothing to preserve yet. On
/// any error the caller must not overwrite `file`.
pub fn create_regular_backup(
    file: &Path,
    backup_dir: &Path,
    retain: usize,
) -> Result<(), PersistError> {
    if !file.is_file() {
        return Ok(());
    }

    fs::create_dir_all(backup_dir).map_err(|source| PersistError::Backup {
        path: backup_dir.to_path_buf(),
        source,
    })?;

    let target = backup_target(file, backup_dir);
    fs::copy(file, &target).map_err(|source| PersistError::Backup {
        path: target.clone(),
        source,
    })?;

    prune_old_backups(file, backup_dir, retain.max(1));
    Ok(())
}

fn file_stem_ext(file: &Path) -> (&str, &str) {
    let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("overlays");
    let ext = file.extension().and_then(|s| s.to_str()).unwrap_or("json");
    (stem, ext)
}

fn backup_target(file: &Path, backup_dir: &Path) -> PathBuf {
    let (stem, ext) = file_stem_ext(file);
    let stamp = Local::now().format("%Y-%m-%d_%H.%M.%S");

    let mut target = backup_dir.join(format!("{stem}_{stamp}.{ext}"));

    // Saves can land within the same second, e.g. on world unload right
    // after a dimension change.
    let mut n = 1;
    while target.exists() {
        target = backup_dir.join(format!("{stem}_{stamp}_{n}.{ext}"));
        n += 1;
    }

    target
}

/// Remove the oldest backups of `file` beyond `retain`. Backups of other
/// files sharing the directory are left alone. Best-effort; failures only
/// log, since the backup itself already succeeded.
fn prune_old_backups(file: &Path, backup_dir: &Path, retain: usize) {
    let (stem, ext) = file_stem_ext(file);
    let prefix = format!("{stem}_");
    let suffix = format!(".{ext}");

    let entries = match fs::read_dir(backup_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not scan {} for pruning: {}", backup_dir.display(), e);
            return;
        }
    };

    let mut backups: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name();
            let name = name.to_str()?;

            if !name.starts_with(&prefix) || !name.ends_with(&suffix) {
                return None;
            }

            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.path()))
        })
        .collect();

    if backups.len() <= retain {
        return;
    }

    backups.sort();

    for (_, path) in backups.drain(..backups.len() - retain) {
        if let Err(e) = fs::remove_file(&path) {
            warn!("Could not prune old backup {}: {}", path.display(), e);
        }
    }
}
