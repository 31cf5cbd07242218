use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use userdata_backup::bookmarks::ChromiumBookmarks;
use userdata_backup::cli::{handle_backup_command, handle_restore_command};
use userdata_backup::config::{ProfilePaths, Settings};
use userdata_backup::display::{format_config, format_target_list};
use userdata_backup::process::SystemProcessGuard;
use userdata_backup::registry::TargetRegistry;

#[derive(Parser)]
#[command(
    name = "userdata-backup",
    version,
    about = "Back up and restore per-user application data",
    long_about = "userdata-backup copies browser bookmarks, sticky notes, mail \
                  signatures, text-expansion dictionaries and editor sessions to a \
                  synced backup folder, and puts them back on a new machine."
)]
struct Cli {
    /// Backup root to use instead of the configured one
    #[arg(long, global = true, value_name = "DIR")]
    backup_root: Option<PathBuf>,

    /// Target list to load instead of the built-in one
    #[arg(long, global = true, value_name = "FILE", env = "USERDATA_BACKUP_TARGETS")]
    targets: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy every target's live data into the backup root
    #[command(alias = "silentback")]
    Backup,

    /// Copy backed-up data back into place
    #[command(alias = "silentrest")]
    Restore,

    /// List targets and what was found on this machine
    Targets,

    /// Show current configuration and paths
    Config {
        /// Persist --backup-root and --targets to the settings file
        #[arg(long)]
        save: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Resolve paths, then layer settings and command-line overrides on top
    let paths = ProfilePaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    if let Some(root) = &cli.backup_root {
        settings.backup_root = Some(root.clone());
    }
    if let Some(targets) = &cli.targets {
        settings.targets_file = Some(targets.clone());
    }
    let paths = paths.apply_settings(&settings);
    debug!(settings = %paths.settings_file().display(), "configuration resolved");

    if let Commands::Config { save } = cli.command {
        if save {
            settings.save(&paths)?;
            println!("Settings saved to {}", paths.settings_file().display());
            println!();
        }
        print!("{}", format_config(&paths, &settings));
        return Ok(ExitCode::SUCCESS);
    }

    let registry =
        TargetRegistry::load(&paths, &settings).context("Failed to load the target list")?;
    let guard = SystemProcessGuard::new();

    match cli.command {
        Commands::Backup => {
            handle_backup_command(&paths, &registry, &guard)?;
        }
        Commands::Restore => {
            let merger = ChromiumBookmarks;
            if !handle_restore_command(&paths, &registry, &guard, &merger)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Targets => {
            println!("{}", format_target_list(&registry));
        }
        Commands::Config { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}
