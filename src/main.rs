//! Snelstart Automation
//!
//! Processes the first invoice found in the invoices directory:
//! 1. Launches Snelstart (through `cmd.exe` when running inside WSL)
//! 2. Logs in with the configured email
//! 3. Runs the upload, selection, matching and saving stages
//!
//! Exit status: 0 on success, 1 when a workflow stage fails, 2 when the
//! configuration or environment prevents a run.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use snelstart_automation::clock::SystemClock;
use snelstart_automation::config::{AppConfig, DEFAULT_CONFIG_PATH};
use snelstart_automation::environment;
use snelstart_automation::inspect::inspect;
use snelstart_automation::invoices::first_invoice;
use snelstart_automation::launcher::AppLauncher;
use snelstart_automation::logging::init_logging;
use snelstart_automation::ui::UiaDesktop;
use snelstart_automation::workflow::Workflow;

const EXIT_WORKFLOW_FAILED: u8 = 1;
const EXIT_SETUP_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "snelstart-automation", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "SNELSTART_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the invoices directory from the configuration
    #[arg(long)]
    invoices: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Process the first invoice (default)
    Run,
    /// Print the UI element tree of the Snelstart window
    Inspect {
        /// How many levels below the window to walk
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },
}

fn main() -> ExitCode {
    // Load environment variables from .env file (optional)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };
    if let Some(dir) = cli.invoices {
        config.paths.invoices = dir;
    }

    let _log_guard = match init_logging(&config.paths.logs) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config),
        Command::Inspect { depth } => run_inspect(&config, depth),
    }
}

fn run(config: &AppConfig) -> ExitCode {
    info!("Starting Snelstart Invoice Automation");

    let invoice = match first_invoice(&config.paths.invoices) {
        Ok(path) => path,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };
    info!("Processing invoice: {}", invoice.display());

    let strategy = environment::detect();
    info!("Launch strategy: {}", strategy);
    let launcher = AppLauncher::new(Box::new(strategy));

    let desktop = match UiaDesktop::new() {
        Ok(desktop) => desktop,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };

    match Workflow::new(config, &desktop, &launcher, SystemClock).run(&invoice) {
        Ok(report) => {
            info!(
                "Automation completed successfully ({} stages, {} login attempt(s))",
                report.completed.len(),
                report.login_attempts
            );
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!("Automation failed at '{}': {}", failure.stage, failure.error);
            if failure.error.is_config_error() {
                ExitCode::from(EXIT_SETUP_FAILED)
            } else {
                ExitCode::from(EXIT_WORKFLOW_FAILED)
            }
        }
    }
}

fn run_inspect(config: &AppConfig, depth: usize) -> ExitCode {
    let desktop = match UiaDesktop::new() {
        Ok(desktop) => desktop,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };

    match inspect(&desktop, &config.snelstart.login.window_titles, depth) {
        Ok(report) => {
            println!("{}", report.render());
            ExitCode::SUCCESS
        }
        Err(e) => {
            warn!("Inspection failed: {}", e);
            ExitCode::from(EXIT_WORKFLOW_FAILED)
        }
    }
}
