//! Directory housekeeping around pair files: pre-creating empty pairs for
//! manual transcription, and removing pair files once merged.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, instrument};

use convarchive_shared::{ConvArchiveError, Result, answer_file_name, question_file_name};

use crate::locator::is_pair_file_name;

/// Counts from [`scaffold_pairs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaffoldSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Create empty `<id>-0q.md` / `<id>-1a.md` files for `start..start + count`.
///
/// Existing files are left untouched and counted as skipped. `dir` is
/// created, with parents, if missing.
#[instrument(skip_all, fields(dir = %dir.display(), start, count))]
pub fn scaffold_pairs(dir: &Path, start: u64, count: u64) -> Result<ScaffoldSummary> {
    let end = start.checked_add(count).ok_or_else(|| {
        ConvArchiveError::validation(format!("id range {start} + {count} overflows"))
    })?;

    std::fs::create_dir_all(dir).map_err(|e| ConvArchiveError::io(dir, e))?;

    let mut summary = ScaffoldSummary::default();
    for id in start..end {
        for name in [question_file_name(id), answer_file_name(id)] {
            if create_empty(&dir.join(&name))? {
                summary.created += 1;
            } else {
                summary.skipped += 1;
            }
        }
    }

    info!(created = summary.created, skipped = summary.skipped, "scaffold complete");
    Ok(summary)
}

/// Create an empty file unless one exists. Returns whether it was created.
fn create_empty(path: &Path) -> Result<bool> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(_) => {
            debug!(path = %path.display(), "created");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "skipped, already exists");
            Ok(false)
        }
        Err(e) => Err(ConvArchiveError::io(path, e)),
    }
}

/// Delete every regular file in `dir` named under either pair-file convention.
/// Returns the number of files removed.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn clean_pairs(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Err(ConvArchiveError::not_found(dir));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ConvArchiveError::io(dir, e))?;
    let mut deleted = 0;

    for entry in entries {
        let entry = entry.map_err(|e| ConvArchiveError::io(dir, e))?;
        let path = entry.path();
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(is_pair_file_name);

        if matches && path.is_file() {
            std::fs::remove_file(&path).map_err(|e| ConvArchiveError::io(&path, e))?;
            debug!(path = %path.display(), "deleted");
            deleted += 1;
        }
    }

    info!(deleted, "clean complete");
    Ok(deleted)
}
