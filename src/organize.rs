//! Re-sorting an extracted tree into per-sender category folders
//!
//! A record's text file and its `attachments/NNNN` directory move as a unit:
//! `<sender>/X.txt` goes to `<sender>/<category>/X.txt` and
//! `<sender>/attachments/NNNN` to `<sender>/<category>/attachments/NNNN`, so
//! the relative references inside the text file keep resolving.

use crate::classify::CategoryTable;
use crate::error::{Error, Result};
use crate::types::{ATTACHMENTS_DIR, OrganizeSummary};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

static RECORD_ID: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^(\d+)_").unwrap());

/// Sequence index prefix of a record file name: `0001_Subject.txt` gives `0001`.
#[must_use]
pub fn record_id(filename: &str) -> Option<&str> {
    RECORD_ID
        .captures(filename)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Move every record under every sender folder of `base_dir` into its category.
///
/// Entries of `base_dir` that are not directories are skipped. A failed move
/// is logged, counted and leaves that record where it was.
pub fn organize_tree(base_dir: impl AsRef<Path>, table: &CategoryTable) -> Result<OrganizeSummary> {
    let base_dir = base_dir.as_ref();
    if !base_dir.is_dir() {
        return Err(Error::TargetNotFound(base_dir.to_path_buf()));
    }

    info!("Scanning {}...", base_dir.display());

    let mut summary = OrganizeSummary::default();
    for sender_dir in sorted_entries(base_dir).map_err(|e| Error::io(base_dir, e))? {
        if !sender_dir.is_dir() {
            continue;
        }
        summary.senders += 1;
        organize_sender(&sender_dir, table, &mut summary);
    }

    debug!("Organization complete.");
    Ok(summary)
}

fn organize_sender(sender_dir: &Path, table: &CategoryTable, summary: &mut OrganizeSummary) {
    let sender = sender_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Processing {sender}...");

    let records = match sorted_entries(sender_dir) {
        Ok(entries) => entries
            .into_iter()
            .filter(|p| p.is_file() && p.to_string_lossy().ends_with(".txt"))
            .collect::<Vec<_>>(),
        Err(e) => {
            error!("Error reading {}: {e}", sender_dir.display());
            summary.failed += 1;
            return;
        }
    };

    for record in records {
        let Some(file_name) = record.file_name() else { continue };
        let name = file_name.to_string_lossy();
        let category_dir = sender_dir.join(table.classify(&name));

        if let Err(e) = std::fs::create_dir_all(&category_dir)
            .and_then(|()| move_entry(&record, &category_dir.join(file_name)))
        {
            error!("Error moving {name}: {e}");
            summary.failed += 1;
            continue;
        }
        summary.moved += 1;
        debug!("Moved {name} to {}", category_dir.display());

        let Some(id) = record_id(&name) else { continue };
        let attachments = sender_dir.join(ATTACHMENTS_DIR).join(id);
        if !attachments.exists() {
            continue;
        }

        let target_parent = category_dir.join(ATTACHMENTS_DIR);
        match std::fs::create_dir_all(&target_parent)
            .and_then(|()| move_entry(&attachments, &target_parent.join(id)))
        {
            Ok(()) => summary.attachment_dirs_moved += 1,
            Err(e) => {
                error!("Error moving attachments for {name}: {e}");
                summary.failed += 1;
            }
        }
    }
}

/// Rename `from` to `to`, refusing to replace anything already at `to`.
fn move_entry(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    std::fs::rename(from, to)
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}
