use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use sysupgrade_splash::{
    ProcessRunner, SplashOutput, SplashRunner, TransactionDisplay, TransactionObserver,
};
use sysupgrade_state::{StateStore, UpgradeLayout};

use crate::journal::{append_journal_entry, read_journal_entries};
use crate::render::{current_output_style, print_status, ConsoleProgress};

pub const DOWNLOAD_COMPLETE: &str = "complete";
pub const UPGRADE_READY: &str = "ready";
pub const UPGRADE_COMPLETE: &str = "complete";

/// Splash mode used while the offline transaction runs.
const SPLASH_MODE_UPDATES: &str = "updates";

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub target_release: String,
    pub datadir: Option<PathBuf>,
    pub distro_sync: bool,
    pub allow_erasing: bool,
    pub best: bool,
}

pub fn run_download_command(layout: &UpgradeLayout, options: DownloadOptions) -> Result<()> {
    // The package-fetch engine is an external collaborator; the default run
    // only records configuration and hands it the datadir.
    run_download_command_with_engine(layout, options, |_datadir| Ok(()))
}

pub fn run_download_command_with_engine(
    layout: &UpgradeLayout,
    options: DownloadOptions,
    engine: impl FnOnce(&Path) -> Result<()>,
) -> Result<()> {
    layout.ensure_base_dirs()?;
    let mut store = StateStore::open(layout.state_path())?;

    let datadir = options.datadir.unwrap_or_else(|| layout.datadir());
    fs::create_dir_all(&datadir)
        .with_context(|| format!("failed to create datadir: {}", datadir.display()))?;

    let mut tx = store.transaction();
    tx.set_target_release(options.target_release.as_str())
        .set_datadir(datadir.to_string_lossy())
        .set_distro_sync(options.distro_sync)
        .set_allow_erasing(options.allow_erasing)
        .set_best(options.best)
        .set_upgrade_command("upgrade")
        .set_download_status("downloading");
    tx.commit()?;

    engine(&datadir)?;

    let mut tx = store.transaction();
    tx.set_download_status(DOWNLOAD_COMPLETE);
    tx.commit()?;

    append_journal_entry(
        &layout.journal_path(),
        "download",
        &format!("target_release={}", options.target_release),
    )?;
    print_status(
        current_output_style(),
        "download",
        "complete; run 'sysupgrade reboot' to begin the upgrade",
    );
    Ok(())
}

pub fn run_reboot_command(layout: &UpgradeLayout) -> Result<()> {
    let mut store = StateStore::open(layout.state_path())?;
    if store.download_status() != Some(DOWNLOAD_COMPLETE) {
        bail!("system is not ready for upgrade: download has not completed");
    }

    let mut tx = store.transaction();
    tx.set_upgrade_status(UPGRADE_READY);
    tx.commit()?;

    append_journal_entry(&layout.journal_path(), "reboot", "upgrade marked ready")?;
    print_status(
        current_output_style(),
        "reboot",
        "upgrade is ready; reboot the system to apply it",
    );
    Ok(())
}

pub fn run_upgrade_command(layout: &UpgradeLayout) -> Result<()> {
    let splash = SplashOutput::new(ProcessRunner::default());
    run_upgrade_command_with_engine(layout, splash, |_observer| Ok(()))
}

/// Applies the downloaded upgrade, reporting transaction progress through the
/// boot splash and the terminal. The package-transaction engine is injected so
/// the flow can run without a package manager present.
pub fn run_upgrade_command_with_engine<R: SplashRunner>(
    layout: &UpgradeLayout,
    splash: SplashOutput<R>,
    engine: impl FnOnce(&mut dyn TransactionObserver) -> Result<()>,
) -> Result<()> {
    let mut store = StateStore::open(layout.state_path())?;
    if store.upgrade_status() != Some(UPGRADE_READY) {
        bail!("upgrade cannot start: system has not been prepared with 'sysupgrade reboot'");
    }

    let mut splash = splash;
    splash.ping();
    splash.set_mode(SPLASH_MODE_UPDATES);
    splash.message("Starting system upgrade. This could take a while.");

    let mut reporter = UpgradeReporter {
        display: TransactionDisplay::new(splash),
        console: ConsoleProgress::new(current_output_style()),
    };
    engine(&mut reporter)?;

    let mut tx = store.transaction();
    tx.set_upgrade_status(UPGRADE_COMPLETE);
    tx.commit()?;

    reporter.display.splash_mut().message("Upgrade complete.");
    reporter.console.finish();

    append_journal_entry(&layout.journal_path(), "upgrade", "transaction applied")?;
    print_status(current_output_style(), "upgrade", "complete");
    Ok(())
}

pub fn run_clean_command(layout: &UpgradeLayout) -> Result<()> {
    let mut store = StateStore::open(layout.state_path())?;
    let datadir = store
        .datadir()
        .map(PathBuf::from)
        .unwrap_or_else(|| layout.datadir());
    store.clear()?;

    if datadir.exists() {
        fs::remove_dir_all(&datadir)
            .with_context(|| format!("failed to remove datadir: {}", datadir.display()))?;
    }

    append_journal_entry(&layout.journal_path(), "clean", "state and packages removed")?;
    print_status(current_output_style(), "clean", "upgrade state cleared");
    Ok(())
}

pub fn run_log_command(layout: &UpgradeLayout, number: Option<usize>) -> Result<()> {
    let entries = read_journal_entries(&layout.journal_path())?;
    if entries.is_empty() {
        println!("No upgrade phases recorded");
        return Ok(());
    }

    match number {
        Some(number) => {
            let entry = entries.get(number.checked_sub(1).unwrap_or(usize::MAX)).ok_or_else(|| {
                anyhow!(
                    "no journal entry {number} (recorded entries: {})",
                    entries.len()
                )
            })?;
            println!(
                "ts={} phase={} detail={}",
                entry.timestamp_unix, entry.phase, entry.detail
            );
        }
        None => {
            for (position, entry) in entries.iter().enumerate() {
                println!(
                    "{}. ts={} phase={} detail={}",
                    position + 1,
                    entry.timestamp_unix,
                    entry.phase,
                    entry.detail
                );
            }
        }
    }
    Ok(())
}

struct UpgradeReporter<R: SplashRunner> {
    display: TransactionDisplay<R>,
    console: ConsoleProgress,
}

impl<R: SplashRunner> TransactionObserver for UpgradeReporter<R> {
    fn item_progress(
        &mut self,
        package: &str,
        action: &str,
        current: u64,
        total: u64,
        index: u64,
        count: u64,
    ) {
        self.display
            .item_progress(package, action, current, total, index, count);
        self.console
            .item_progress(package, action, current, total, index, count);
    }

    fn verify_item(&mut self, package: &str, index: u64, count: u64) {
        self.display.verify_item(package, index, count);
        self.console.verify_item(package, index, count);
    }
}
