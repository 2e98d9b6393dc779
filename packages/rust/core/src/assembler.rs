//! Merged document assembler.
//!
//! Reads every located pair in ascending id order and renders one markdown
//! document:
//!
//! ```text
//! # Conversation Archive
//!
//! Generated from <directory>
//!
//! ## 1. Question
//!
//! <question, headings demoted>
//!
//! ## Answer
//!
//! <answer, headings demoted>
//!
//! ---
//! ```

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use convarchive_markdown::demote_headers;
use convarchive_shared::{ConvArchiveError, FileRole, PairFileSet, PairFiles, Result};

const QUESTION_MISSING: &str = "*(Question file missing)*";
const ANSWER_MISSING: &str = "*(Answer file missing)*";

/// Options controlling document rendering.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Top-level document title.
    pub title: String,
    /// Label naming the source in the header line (usually the directory name).
    pub source_label: String,
    /// Shallowest heading level allowed inside a fragment.
    pub heading_depth: usize,
}

/// Render the merged document for `pairs`, reading fragments from `dir`.
#[instrument(skip_all, fields(dir = %dir.display(), pairs = pairs.len()))]
pub fn assemble_document(dir: &Path, pairs: &PairFileSet, opts: &AssembleOptions) -> Result<String> {
    let mut doc = format!(
        "# {}\n\nGenerated from {}\n\n",
        opts.title, opts.source_label
    );

    for (id, files) in pairs.iter() {
        render_pair(&mut doc, dir, id, files, opts.heading_depth)?;
    }

    debug!(bytes = doc.len(), "document assembled");
    Ok(doc)
}

/// Write `content` to `path`, replacing any existing file.
pub fn write_document(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| ConvArchiveError::io(path, e))?;
    info!(path = %path.display(), bytes = content.len(), "merged document written");
    Ok(())
}

fn render_pair(
    doc: &mut String,
    dir: &Path,
    id: u64,
    files: &PairFiles,
    heading_depth: usize,
) -> Result<()> {
    doc.push_str(&format!("## {id}. Question\n\n"));
    render_side(doc, dir, files.file_name(FileRole::Question), QUESTION_MISSING, heading_depth)?;

    doc.push_str("## Answer\n\n");
    render_side(doc, dir, files.file_name(FileRole::Answer), ANSWER_MISSING, heading_depth)?;

    doc.push_str("---\n\n");
    Ok(())
}

fn render_side(
    doc: &mut String,
    dir: &Path,
    file_name: Option<&str>,
    placeholder: &str,
    heading_depth: usize,
) -> Result<()> {
    match file_name {
        Some(name) => {
            let fragment = read_fragment(&dir.join(name))?;
            doc.push_str(&demote_headers(fragment.trim(), heading_depth));
        }
        None => doc.push_str(placeholder),
    }
    doc.push_str("\n\n");
    Ok(())
}

/// Read a pair file, replacing invalid UTF-8 rather than failing the merge.
fn read_fragment(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ConvArchiveError::io(path, e))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(path = %path.display(), "pair file is not valid UTF-8, replacing invalid bytes");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}
