use std::sync::Arc;

use glam::DVec3;
use log::error;
use serde::{Deserialize, Serialize};

fn def_settle_timeout_ms() -> u64 {
    5000
}

fn def_settle_sentinel() -> DVec3 {
    // Initial placement used by the client world until the real spawn
    // position has arrived from the server.
    DVec3::new(8.5, 65.0, 8.5)
}

fn def_backup_dir_name() -> Arc<str> {
    "backups".into()
}

fn def_backup_count() -> usize {
    10
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    /// How long rendering stays suppressed after a (re)connect, unless the
    /// camera leaves the sentinel position first.
    #[serde(default = "def_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    /// Camera position that means "not placed yet". Depends entirely on the
    /// host's world initialization, so it is configurable rather than
    /// baked in.
    #[serde(default = "def_settle_sentinel")]
    pub settle_sentinel: DVec3,

    /// Subdirectory beside each save file that receives pre-write backups.
    #[serde(default = "def_backup_dir_name")]
    pub backup_dir_name: Arc<str>,

    /// Backups retained per save file; older ones are pruned.
    #[serde(default = "def_backup_count")]
    pub backup_count: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: def_settle_timeout_ms(),
            settle_sentinel: def_settle_sentinel(),
            backup_dir_name: def_backup_dir_name(),
            backup_count: def_backup_count(),
        }
    }
}

impl OverlayConfig {
    /// Parse a YAML config document, falling back to defaults if it does
    /// not parse.
    pub fn from_yaml(yaml: &str) -> Self {
        match serde_yaml::from_str::<Self>(yaml) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to parse overlay config, falling back to defaults.");
                error!("{}", e);
                Self::default()
            }
        }
    }

    pub(crate) fn settle_timeout_nanos(&self) -> u64 {
        self.settle_timeout_ms.saturating_mul(1_000_000)
    }
}
