use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{backup, container::OverlayContainer, overlay::OverlayHandle};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not back up {path:?}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Group overlays by their persistence destination, in registration order
/// within each group. Overlays with a blank save id or no destination do
/// not persist. A destination may collect overlays of unrelated concrete
/// types.
pub(crate) fn group_by_save_file(
    renderers: &[OverlayHandle],
    is_dimension_change_only: bool,
) -> BTreeMap<PathBuf, Vec<OverlayHandle>> {
    let mut groups: BTreeMap<PathBuf, Vec<OverlayHandle>> = BTreeMap::new();

    for renderer in renderers {
        let r = renderer.borrow();

        if r.save_id().trim().is_empty() {
            continue;
        }

        if let Some(file) = r.save_file(is_dimension_change_only) {
            groups.entry(file).or_default().push(renderer.clone());
        }
    }

    groups
}

fn write_json_file(value: &Value, file: &Path) -> Result<(), PersistError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| PersistError::Encode {
        path: file.to_path_buf(),
        source,
    })?;

    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistError::Write {
            path: file.to_path_buf(),
            source,
        })?;
    }

    fs::write(file, text).map_err(|source| PersistError::Write {
        path: file.to_path_buf(),
        source,
    })
}

impl OverlayContainer {
    /// Write every persistable overlay's state, one JSON document per
    /// destination file, keyed by save id. Each destination is backed up
    /// into its sibling backup directory first; if the backup fails, that
    /// destination is skipped and its previous contents stay intact.
    /// Failures never spread across destinations.
    pub fn save_to_file(&self, is_dimension_change_only: bool) {
        let groups = group_by_save_file(&self.renderers, is_dimension_change_only);

        for (file, group) in &groups {
            let mut obj = Map::new();

            for renderer in group {
                let r = renderer.borrow();
                obj.insert(r.save_id().to_owned(), r.to_json());
            }

            let backup_dir = file
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(self.config.backup_dir_name.as_ref());

            if let Err(e) = backup::create_regular_backup(file, &backup_dir, self.config.backup_count)
            {
                warn!("Skipping save of {}: {}", file.display(), e);
                continue;
            }

            if let Err(e) = write_json_file(&Value::Object(obj), file) {
                warn!("{}", e);
            }
        }
    }

    /// Restore overlay state from the grouped save files. Missing,
    /// unreadable or malformed destinations are skipped wholesale; an
    /// overlay whose id is absent from its file keeps its in-memory state.
    /// Import faults propagate.
    pub fn load_from_file(&mut self, is_dimension_change_only: bool) -> anyhow::Result<()> {
        let groups = group_by_save_file(&self.renderers, is_dimension_change_only);

        for (file, group) in &groups {
            let text = match fs::read_to_string(file) {
                Ok(text) => text,
                Err(_) => continue,
            };

            let root: Value = match serde_json::from_str(&text) {
                Ok(root) => root,
                Err(e) => {
                    warn!("Ignoring malformed overlay data in {}: {}", file.display(), e);
                    continue;
                }
            };

            let Some(obj) = root.as_object() else {
                warn!(
                    "Ignoring overlay data in {}: root is not an object",
                    file.display()
                );
                continue;
            };

            for renderer in group {
                let mut r = renderer.borrow_mut();
                let id = r.save_id().to_owned();

                if let Some(value) = obj.get(&id) {
                    if value.is_object() {
                        r.from_json(value)?;
                    }
                }
            }
        }

        Ok(())
    }
}
