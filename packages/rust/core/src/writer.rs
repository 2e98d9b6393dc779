//! Writes pairs to numbered question/answer files.

use std::path::Path;

use tracing::{debug, info, instrument};

use convarchive_shared::{ConvArchiveError, Pair, Result, answer_file_name, question_file_name};

/// Counts from a completed write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Pairs processed.
    pub pairs: usize,
    /// Files written (one or two per pair).
    pub files: usize,
}

/// Write each pair's present sides to `<index>-0q.md` / `<index>-1a.md` in `dir`.
///
/// Content is written verbatim and replaces any existing file. `dir` is
/// created, with parents, if missing.
#[instrument(skip_all, fields(dir = %dir.display(), pairs = pairs.len()))]
pub fn write_pairs(dir: &Path, pairs: &[Pair]) -> Result<WriteSummary> {
    std::fs::create_dir_all(dir).map_err(|e| ConvArchiveError::io(dir, e))?;

    let mut summary = WriteSummary::default();

    for pair in pairs {
        if let Some(question) = pair.question() {
            write_file(dir, &question_file_name(pair.index), question)?;
            summary.files += 1;
        }
        if let Some(answer) = pair.answer() {
            write_file(dir, &answer_file_name(pair.index), answer)?;
            summary.files += 1;
        }
        summary.pairs += 1;
    }

    info!(files = summary.files, "pair files written");
    Ok(summary)
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, content).map_err(|e| ConvArchiveError::io(&path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote pair file");
    Ok(())
}
