//! Invoice processing workflow
//!
//! Runs the stages for one invoice in order and stops at the first failure.
//! Transaction selection, matching and saving have no behaviour yet and
//! always succeed after the configured delay.

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::AutomationError;
use crate::launcher::AppLauncher;
use crate::login::LoginSequencer;
use crate::ui::Desktop;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Steps of the invoice workflow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Launch,
    Login,
    UploadInvoice,
    SelectTransaction,
    MatchInvoice,
    SaveResult,
}

impl Stage {
    /// Every stage in the order `Workflow::run` executes them
    pub const ALL: [Stage; 6] = [
        Stage::Launch,
        Stage::Login,
        Stage::UploadInvoice,
        Stage::SelectTransaction,
        Stage::MatchInvoice,
        Stage::SaveResult,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Launch => "Launch Snelstart",
            Stage::Login => "Login",
            Stage::UploadInvoice => "Upload Invoice",
            Stage::SelectTransaction => "Select Transaction",
            Stage::MatchInvoice => "Match Invoice to Transaction",
            Stage::SaveResult => "Save Result",
        };
        f.write_str(name)
    }
}

/// The stage that stopped the workflow and why
#[derive(Error, Debug)]
#[error("Step failed: {stage}: {error}")]
pub struct WorkflowFailure {
    pub stage: Stage,
    pub error: AutomationError,
}

/// Outcome of a successful run
#[derive(Debug)]
pub struct WorkflowReport {
    pub invoice: PathBuf,
    /// Stages finished, in order
    pub completed: Vec<Stage>,
    /// Process id of the launched application (the `cmd.exe` shim under WSL)
    pub pid: Option<u32>,
    pub login_attempts: u32,
}

/// Runs all stages for one invoice against a desktop and launcher
pub struct Workflow<'a, D: Desktop, C: Clock> {
    config: &'a AppConfig,
    desktop: &'a D,
    launcher: &'a AppLauncher,
    clock: C,
}

impl<'a, D: Desktop, C: Clock> Workflow<'a, D, C> {
    /// Assemble a workflow; the config must already be validated
    pub fn new(
        config: &'a AppConfig,
        desktop: &'a D,
        launcher: &'a AppLauncher,
        clock: C,
    ) -> Self {
        Self {
            config,
            desktop,
            launcher,
            clock,
        }
    }

    /// Process a single invoice through every stage
    pub fn run(&self, invoice: &Path) -> Result<WorkflowReport, WorkflowFailure> {
        info!("Starting invoice processing workflow for: {}", invoice.display());

        let mut report = WorkflowReport {
            invoice: invoice.to_path_buf(),
            completed: Vec::new(),
            pid: None,
            login_attempts: 0,
        };

        for stage in Stage::ALL {
            info!("Executing step: {}", stage);
            if let Err(error) = self.run_stage(stage, &mut report) {
                error!("Step failed: {}: {}", stage, error);
                return Err(WorkflowFailure { stage, error });
            }
            report.completed.push(stage);
        }

        info!("Invoice processing completed successfully");
        Ok(report)
    }

    fn run_stage(
        &self,
        stage: Stage,
        report: &mut WorkflowReport,
    ) -> Result<(), AutomationError> {
        match stage {
            Stage::Launch => {
                let handle = self.launcher.launch(&self.config.snelstart.app_path)?;
                info!("Snelstart started (pid {}, {})", handle.pid, handle.strategy);
                report.pid = Some(handle.pid);
                info!("Waiting for Snelstart to start...");
                self.clock.sleep(self.config.startup_wait());
            }
            Stage::Login => {
                let session = LoginSequencer::new(self.desktop, &self.clock, self.config).run()?;
                report.login_attempts = session.attempts;
            }
            Stage::UploadInvoice => {
                if !report.invoice.is_file() {
                    return Err(AutomationError::InvoiceNotFound(report.invoice.clone()));
                }
                info!("Uploading invoice: {}", report.invoice.display());
                self.clock.sleep(self.config.delay());
            }
            Stage::SelectTransaction | Stage::MatchInvoice | Stage::SaveResult => {
                self.clock.sleep(self.config.delay());
            }
        }
        Ok(())
    }
}
