//! Invoice discovery

use crate::error::{AutomationError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Regular files in `dir`, sorted by file name
pub fn list_invoices(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AutomationError::InvoiceDirNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!("Found {} invoice file(s) in {}", files.len(), dir.display());
    Ok(files)
}

/// First invoice in `dir`, the one a single run processes
pub fn first_invoice(dir: &Path) -> Result<PathBuf> {
    list_invoices(dir)?
        .into_iter()
        .next()
        .ok_or_else(|| AutomationError::NoInvoices(dir.to_path_buf()))
}
