use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// On-disk layout of the upgrade working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeLayout {
    root: PathBuf,
}

impl UpgradeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The durable upgrade-state file.
    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Append-only record of phase runs, read back by the `log` command.
    pub fn journal_path(&self) -> PathBuf {
        self.root.join("upgrade.journal")
    }

    /// Where downloaded packages are kept between the download and apply phases.
    pub fn datadir(&self) -> PathBuf {
        self.root.join("packages")
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.datadir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn default_upgrade_root() -> PathBuf {
    if let Some(root) = std::env::var_os("SYSUPGRADE_ROOT") {
        return PathBuf::from(root);
    }
    PathBuf::from("/var/lib/sysupgrade")
}
