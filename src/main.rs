use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use jvibe::config::{EngineConfig, TEMPLATE_DIR_ENV, UninstallOptions, UpgradeOptions};
use jvibe::error::JvibeError;
use jvibe::migrate::Catalog;
use jvibe::output::Format;

#[derive(Parser)]
#[command(
    name = "jvibe",
    version,
    about = "Detects and migrates outdated .claude/ and docs/ project scaffolding"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,
    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the project version and migrate it to the current layout
    Upgrade {
        /// Report the migration plan without changing anything
        #[arg(long)]
        check: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
        /// Template directory to migrate towards
        #[arg(long, env = TEMPLATE_DIR_ENV)]
        template_dir: Option<PathBuf>,
    },
    /// Render the AI migration work order for the project's content drift
    WorkOrder {
        /// Write the work order to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Template directory to compare documents against
        #[arg(long, env = TEMPLATE_DIR_ENV)]
        template_dir: Option<PathBuf>,
    },
    /// Show the installed version and component counts
    Status,
    /// Check the installed configuration for missing or broken pieces
    Validate,
    /// Remove the jvibe configuration and core documents
    Uninstall {
        /// Also remove docs/project/
        #[arg(long)]
        purge_project_docs: bool,
        /// Do not copy removed files into a backup directory
        #[arg(long)]
        no_backup: bool,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("JVIBE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // A second init only happens when embedded; keep the existing subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli, project_dir: &Path, format: Format) -> jvibe::error::Result<()> {
    let catalog = Catalog::builtin();
    match cli.command {
        Commands::Upgrade {
            check,
            force,
            template_dir,
        } => {
            let config = EngineConfig::resolve(template_dir.as_deref());
            jvibe::commands::upgrade::run(
                project_dir,
                &config,
                &catalog,
                UpgradeOptions { check, force },
                format,
            )
        }
        Commands::WorkOrder {
            output,
            template_dir,
        } => {
            let config = EngineConfig::resolve(template_dir.as_deref());
            jvibe::commands::work_order::run(
                project_dir,
                &config,
                &catalog,
                output.as_deref(),
                format,
            )
        }
        Commands::Status => jvibe::commands::status::run(project_dir, format),
        Commands::Validate => jvibe::commands::validate::run(project_dir, format),
        Commands::Uninstall {
            purge_project_docs,
            no_backup,
        } => jvibe::commands::uninstall::run(
            project_dir,
            UninstallOptions {
                purge_project_docs,
                backup: !no_backup,
            },
            format,
        ),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    init_tracing(cli.quiet, cli.verbose);

    let project_dir = match cli.project.clone() {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => report_and_exit(&JvibeError::Io(e), None, format),
        },
    };

    if let Err(e) = run(cli, &project_dir, format) {
        // Only executor failures can leave a half-migrated tree behind.
        let backup = match e {
            JvibeError::Step { .. } => jvibe::backup::latest_backup(&project_dir),
            _ => None,
        };
        report_and_exit(&e, backup, format);
    }
}

fn report_and_exit(e: &JvibeError, backup: Option<String>, format: Format) -> ! {
    match format {
        Format::Json => {
            let mut body = serde_json::json!({
                "error": e.code(),
                "message": e.to_string()
            });
            if let Some(dir) = &backup {
                body["backup"] = serde_json::Value::String(dir.clone());
            }
            eprintln!("{body}");
        }
        _ => {
            eprintln!("error: {e}");
            if let Some(dir) = &backup {
                eprintln!(
                    "{} most recent backup: {}/",
                    "hint:".yellow().bold(),
                    dir
                );
            }
        }
    }
    std::process::exit(1);
}
