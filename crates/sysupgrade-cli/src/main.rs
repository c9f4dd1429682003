use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use sysupgrade_state::{default_upgrade_root, UpgradeLayout};

mod journal;
mod phases;
mod render;


#[derive(Parser, Debug)]
#[command(name = "sysupgrade")]
#[command(about = "Offline system-upgrade driver with boot-splash progress", long_about = None)]
struct Cli {
    /// Working directory for upgrade state (defaults to /var/lib/sysupgrade).
    #[arg(long)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record upgrade configuration and fetch packages for the next release
    Download {
        #[arg(long)]
        target_release: String,
        #[arg(long)]
        datadir: Option<PathBuf>,
        #[arg(long)]
        distro_sync: bool,
        #[arg(long)]
        allow_erasing: bool,
        #[arg(long)]
        best: bool,
    },
    /// Mark the downloaded upgrade ready to apply on the next boot
    Reboot,
    /// Apply the downloaded upgrade (runs during the offline boot)
    Upgrade,
    /// Remove stored upgrade state and downloaded packages
    Clean,
    /// Show recorded upgrade phase runs, or one entry by number
    Log { number: Option<usize> },
    /// Generate shell completions
    Completions { shell: Shell },
}

fn main() -> Result<()> {
    run_cli(Cli::parse())
}

fn run_cli(cli: Cli) -> Result<()> {
    let layout = UpgradeLayout::new(cli.root.unwrap_or_else(default_upgrade_root));

    match cli.command {
        Commands::Download {
            target_release,
            datadir,
            distro_sync,
            allow_erasing,
            best,
        } => phases::run_download_command(
            &layout,
            phases::DownloadOptions {
                target_release,
                datadir,
                distro_sync,
                allow_erasing,
                best,
            },
        ),
        Commands::Reboot => phases::run_reboot_command(&layout),
        Commands::Upgrade => phases::run_upgrade_command(&layout),
        Commands::Clean => phases::run_clean_command(&layout),
        Commands::Log { number } => phases::run_log_command(&layout, number),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sysupgrade", &mut io::stdout());
            Ok(())
        }
    }
}
