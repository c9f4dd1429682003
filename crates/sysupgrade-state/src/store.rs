use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

const STATE_FILE_VERSION: u32 = 1;

/// The enumerated upgrade configuration carried across reboots. Absent string
/// fields read as `None`, absent booleans as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeState {
    #[serde(default)]
    pub download_status: Option<String>,
    #[serde(default)]
    pub upgrade_status: Option<String>,
    #[serde(default)]
    pub datadir: Option<String>,
    #[serde(default)]
    pub target_release: Option<String>,
    #[serde(default)]
    pub upgrade_command: Option<String>,
    #[serde(default)]
    pub distro_sync: bool,
    #[serde(default)]
    pub allow_erasing: bool,
    #[serde(default)]
    pub best: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    state: UpgradeState,
}

/// Crash-safe store for [`UpgradeState`], backed by a single file that is only
/// ever replaced whole. Reads return the last committed snapshot; writes go
/// through a scoped [`StateTransaction`].
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    snapshot: UpgradeState,
}

impl StateStore {
    /// Loads the committed state. A missing file yields all-unset defaults; an
    /// unreadable or malformed file is a fatal configuration error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = read_state_file(&path)?;
        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn download_status(&self) -> Option<&str> {
        self.snapshot.download_status.as_deref()
    }

    pub fn upgrade_status(&self) -> Option<&str> {
        self.snapshot.upgrade_status.as_deref()
    }

    pub fn datadir(&self) -> Option<&str> {
        self.snapshot.datadir.as_deref()
    }

    pub fn target_release(&self) -> Option<&str> {
        self.snapshot.target_release.as_deref()
    }

    pub fn upgrade_command(&self) -> Option<&str> {
        self.snapshot.upgrade_command.as_deref()
    }

    pub fn distro_sync(&self) -> bool {
        self.snapshot.distro_sync
    }

    pub fn allow_erasing(&self) -> bool {
        self.snapshot.allow_erasing
    }

    pub fn best(&self) -> bool {
        self.snapshot.best
    }

    /// Opens a scoped write transaction. Staged changes become visible (and
    /// durable) only on `commit`; dropping the transaction discards them.
    pub fn transaction(&mut self) -> StateTransaction<'_> {
        let staged = self.snapshot.clone();
        StateTransaction {
            store: self,
            staged,
        }
    }

    /// Removes all persisted fields. Safe to call when no state file exists.
    pub fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove state file: {}", self.path.display()))?;
        }
        self.snapshot = UpgradeState::default();
        Ok(())
    }
}

/// Mutable view over a batch of staged field writes. All-or-nothing: `commit`
/// persists every staged write atomically, anything else persists none.
#[derive(Debug)]
pub struct StateTransaction<'a> {
    store: &'a mut StateStore,
    staged: UpgradeState,
}

impl StateTransaction<'_> {
    pub fn set_download_status(&mut self, value: impl Into<String>) -> &mut Self {
        self.staged.download_status = Some(value.into());
        self
    }

    pub fn set_upgrade_status(&mut self, value: impl Into<String>) -> &mut Self {
        self.staged.upgrade_status = Some(value.into());
        self
    }

    pub fn set_datadir(&mut self, value: impl Into<String>) -> &mut Self {
        self.staged.datadir = Some(value.into());
        self
    }

    pub fn set_target_release(&mut self, value: impl Into<String>) -> &mut Self {
        self.staged.target_release = Some(value.into());
        self
    }

    pub fn set_upgrade_command(&mut self, value: impl Into<String>) -> &mut Self {
        self.staged.upgrade_command = Some(value.into());
        self
    }

    pub fn set_distro_sync(&mut self, value: bool) -> &mut Self {
        self.staged.distro_sync = value;
        self
    }

    pub fn set_allow_erasing(&mut self, value: bool) -> &mut Self {
        self.staged.allow_erasing = value;
        self
    }

    pub fn set_best(&mut self, value: bool) -> &mut Self {
        self.staged.best = value;
        self
    }

    pub fn commit(self) -> Result<()> {
        write_state_file(&self.store.path, &self.staged)?;
        self.store.snapshot = self.staged;
        Ok(())
    }
}

fn read_state_file(path: &Path) -> Result<UpgradeState> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(UpgradeState::default());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read state file: {}", path.display()));
        }
    };

    let file: StateFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing state file: {}", path.display()))?;
    if file.version != STATE_FILE_VERSION {
        return Err(anyhow!(
            "unsupported state file version {} in {}",
            file.version,
            path.display()
        ));
    }
    Ok(file.state)
}

fn write_state_file(path: &Path, state: &UpgradeState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let payload = serde_json::to_string_pretty(&StateFile {
        version: STATE_FILE_VERSION,
        state: state.clone(),
    })
    .with_context(|| format!("failed serializing state for {}", path.display()))?;

    // Write a temp sibling, make it durable, then rename over the old file so
    // a crash at any point leaves either the old state or the new state.
    let tmp = tmp_sibling(path);
    let mut file = File::create(&tmp)
        .with_context(|| format!("failed to create temp state file: {}", tmp.display()))?;
    file.write_all(payload.as_bytes())
        .with_context(|| format!("failed to write temp state file: {}", tmp.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp state file: {}", tmp.display()))?;
    drop(file);

    fs::rename(&tmp, path).with_context(|| {
        format!(
            "failed to replace state file {} with {}",
            path.display(),
            tmp.display()
        )
    })?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    path.with_file_name(format!("{name}.tmp-{}", std::process::id()))
}
