//! Snelstart Automation
//!
//! Drives the Snelstart accounting application on Windows through Microsoft
//! UI Automation: launches it, logs in, and runs the invoice workflow for a
//! single invoice.
//!
//! ## Architecture
//! - `environment` - WSL detection, selects the launch strategy
//! - `launcher` - validates and spawns the Snelstart executable
//! - `ui` - `Desktop` abstraction over UI Automation
//! - `input` - SendInput keystroke injection
//! - `login` - retrying login state machine
//! - `workflow` - stage sequencing for one invoice
//! - `inspect` - element tree dump for writing UI queries

pub mod clock;
pub mod config;
pub mod environment;
pub mod error;
pub mod input;
pub mod inspect;
pub mod invoices;
pub mod launcher;
pub mod logging;
pub mod login;
pub mod ui;
pub mod workflow;

pub use error::{AutomationError, Result};
