//! End-to-end pipelines.
//!
//! - `convert`: transcript JSON → extract → dedup → sort → pair → pair files
//! - `merge`: pair files → locate → assemble → merged markdown document

use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::{info, instrument, warn};

use convarchive_shared::{ConvArchiveError, Result};

use crate::assembler::{self, AssembleOptions};
use crate::dedup::{dedup_messages, sort_chronologically};
use crate::extract::extract_messages;
use crate::locator::{is_pair_file_name, locate_pairs};
use crate::pairing::build_pairs;
use crate::writer::write_pairs;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each input file is read (successfully or not).
    fn file_read(&self, path: &Path, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn finish(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_read(&self, _path: &Path, _current: usize, _total: usize) {}
    fn finish(&self) {}
}

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

/// Configuration for the `convert` pipeline.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Directory pair files are written to.
    pub target_dir: PathBuf,
    /// Index of the first emitted pair.
    pub start_index: u64,
    /// Transcript JSON files, read in order.
    pub inputs: Vec<PathBuf>,
    /// Content prefix length for identifier-less dedup keys.
    pub dedup_prefix_chars: usize,
}

/// Result of the `convert` pipeline.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    pub target_dir: PathBuf,
    /// Inputs parsed as JSON.
    pub files_read: usize,
    /// Inputs missing, unreadable, or not JSON.
    pub files_skipped: usize,
    /// Records extracted before deduplication.
    pub messages_extracted: usize,
    /// Records left after deduplication.
    pub unique_messages: usize,
    pub pair_count: usize,
    pub files_written: usize,
    /// Index range written, when any pairs were produced.
    pub indices: Option<(u64, u64)>,
    pub elapsed: std::time::Duration,
}

/// Run the full `convert` pipeline.
#[instrument(skip_all, fields(target = %opts.target_dir.display(), start = opts.start_index))]
pub fn convert(opts: &ConvertOptions, progress: &dyn ProgressReporter) -> Result<ConvertResult> {
    let start = Instant::now();

    if opts.inputs.is_empty() {
        return Err(ConvArchiveError::validation("no transcript files given"));
    }

    progress.phase("Reading transcripts");
    let docs = load_documents(&opts.inputs, progress);
    let files_read = docs.len();

    progress.phase("Pairing messages");
    let messages = extract_messages(&docs);
    let messages_extracted = messages.len();
    let messages = sort_chronologically(dedup_messages(messages, opts.dedup_prefix_chars));
    let unique_messages = messages.len();
    let pairs = build_pairs(&messages, opts.start_index);

    info!(
        messages = messages_extracted,
        unique = unique_messages,
        pairs = pairs.len(),
        "transcripts paired"
    );

    progress.phase("Writing pair files");
    let written = write_pairs(&opts.target_dir, &pairs)?;

    let indices = match (pairs.first(), pairs.last()) {
        (Some(first), Some(last)) => Some((first.index, last.index)),
        _ => None,
    };

    progress.finish();

    Ok(ConvertResult {
        target_dir: opts.target_dir.clone(),
        files_read,
        files_skipped: opts.inputs.len() - files_read,
        messages_extracted,
        unique_messages,
        pair_count: written.pairs,
        files_written: written.files,
        indices,
        elapsed: start.elapsed(),
    })
}

/// Read and parse each input. Failures are logged and the file skipped.
pub fn load_documents(inputs: &[PathBuf], progress: &dyn ProgressReporter) -> Vec<Value> {
    let total = inputs.len();
    let mut docs = Vec::with_capacity(total);

    for (i, path) in inputs.iter().enumerate() {
        if let Some(doc) = load_document(path) {
            docs.push(doc);
        }
        progress.file_read(path, i + 1, total);
    }

    docs
}

fn load_document(path: &Path) -> Option<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable transcript");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping transcript that is not valid JSON");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

/// Configuration for the `merge` pipeline.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Directory holding pair files; the merged document is written here too.
    pub dir: PathBuf,
    /// File name of the merged document.
    pub output_filename: String,
    /// Top-level document title.
    pub title: String,
    /// Shallowest heading level allowed inside a fragment.
    pub heading_depth: usize,
}

/// Result of the `merge` pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merged document was written.
    Merged { output_path: PathBuf, pair_count: usize },
    /// The directory holds no pair files; nothing was written.
    NothingToMerge,
}

/// Run the full `merge` pipeline.
#[instrument(skip_all, fields(dir = %opts.dir.display(), output = %opts.output_filename))]
pub fn merge(opts: &MergeOptions, progress: &dyn ProgressReporter) -> Result<MergeOutcome> {
    if !is_plain_file_name(&opts.output_filename) {
        return Err(ConvArchiveError::validation(format!(
            "output file '{}' must be a plain file name inside the merged directory",
            opts.output_filename
        )));
    }
    if is_pair_file_name(&opts.output_filename) {
        return Err(ConvArchiveError::validation(format!(
            "output file '{}' would overwrite a pair file",
            opts.output_filename
        )));
    }

    progress.phase("Locating pair files");
    let pairs = locate_pairs(&opts.dir)?;

    if pairs.is_empty() {
        info!("no pair files found");
        progress.finish();
        return Ok(MergeOutcome::NothingToMerge);
    }

    progress.phase("Assembling document");
    let assemble_opts = AssembleOptions {
        title: opts.title.clone(),
        source_label: source_label(&opts.dir),
        heading_depth: opts.heading_depth,
    };
    let document = assembler::assemble_document(&opts.dir, &pairs, &assemble_opts)?;

    let output_path = opts.dir.join(&opts.output_filename);
    assembler::write_document(&output_path, &document)?;

    progress.finish();

    Ok(MergeOutcome::Merged {
        output_path,
        pair_count: pairs.len(),
    })
}

/// A single normal path component: no separators, no `..`, not absolute.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Name of the directory as shown in the document header, resolving `.` and
/// relative paths first.
fn source_label(dir: &Path) -> String {
    let resolved = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use convarchive_shared::FileRole;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "convarchive-pipeline-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn convert_opts(target_dir: PathBuf, start_index: u64, inputs: Vec<PathBuf>) -> ConvertOptions {
        ConvertOptions {
            target_dir,
            start_index,
            inputs,
            dedup_prefix_chars: 20,
        }
    }

    fn merge_opts(dir: PathBuf) -> MergeOptions {
        MergeOptions {
            dir,
            output_filename: "README.md".into(),
            title: "Conversation Archive".into(),
            heading_depth: 3,
        }
    }

    #[test]
    fn convert_simple_exchange() {
        let root = temp_dir();
        let input = root.join("chat.json");
        std::fs::write(
            &input,
            r#"[
                {"sender":"user","message":"Hi","createTime":"2024-01-01T00:00:00Z"},
                {"sender":"assistant","message":"Hello","createTime":"2024-01-01T00:00:01Z"}
            ]"#,
        )
        .unwrap();

        let out = root.join("pairs");
        let result = convert(&convert_opts(out.clone(), 5, vec![input]), &SilentProgress).unwrap();

        assert_eq!(result.pair_count, 1);
        assert_eq!(result.indices, Some((5, 5)));
        assert_eq!(std::fs::read_to_string(out.join("5-0q.md")).unwrap(), "Hi");
        assert_eq!(std::fs::read_to_string(out.join("5-1a.md")).unwrap(), "Hello");
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn convert_merges_overlapping_exports_in_time_order() {
        let root = temp_dir();
        let first = root.join("part1.json");
        let second = root.join("part2.json");
        std::fs::write(
            &first,
            r#"{"responses":[
                {"responseId":"b","sender":"assistant","message":"A1","createTime":"2024-01-01T00:00:02Z"},
                {"responseId":"a","sender":"human","message":"Q1","createTime":"2024-01-01T00:00:01Z"}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            &second,
            r#"{"messages":[
                {"responseId":"b","role":"assistant","content":"A1 edited","created":"2024-01-01T00:00:02Z"},
                {"responseId":"c","role":"user","content":"Q2","created":"2024-01-01T00:00:03Z"}
            ]}"#,
        )
        .unwrap();

        let out = root.join("pairs");
        let result =
            convert(&convert_opts(out.clone(), 1, vec![first, second]), &SilentProgress).unwrap();

        assert_eq!(result.messages_extracted, 4);
        assert_eq!(result.unique_messages, 3);
        assert_eq!(result.pair_count, 2);
        assert_eq!(std::fs::read_to_string(out.join("1-0q.md")).unwrap(), "Q1");
        assert_eq!(std::fs::read_to_string(out.join("1-1a.md")).unwrap(), "A1 edited");
        assert_eq!(std::fs::read_to_string(out.join("2-0q.md")).unwrap(), "Q2");
        assert!(!out.join("2-1a.md").exists());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn convert_skips_bad_inputs_and_continues() {
        let root = temp_dir();
        let broken = root.join("broken.json");
        let good = root.join("good.json");
        std::fs::write(&broken, "{ not json").unwrap();
        std::fs::write(&good, r#"[{"sender":"user","message":"still here"}]"#).unwrap();

        let inputs = vec![root.join("missing.json"), broken, good];
        let out = root.join("pairs");
        let result = convert(&convert_opts(out.clone(), 0, inputs), &SilentProgress).unwrap();

        assert_eq!(result.files_read, 1);
        assert_eq!(result.files_skipped, 2);
        assert_eq!(std::fs::read_to_string(out.join("0-0q.md")).unwrap(), "still here");
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn convert_requires_inputs() {
        let err = convert(&convert_opts(temp_dir(), 0, vec![]), &SilentProgress).unwrap_err();
        assert!(matches!(err, ConvArchiveError::Validation { .. }));
    }

    #[test]
    fn written_pairs_are_located_back() {
        let root = temp_dir();
        let input = root.join("chat.json");
        std::fs::write(
            &input,
            r#"[
                {"sender":"assistant","message":"orphan","createTime":1},
                {"sender":"user","message":"q1","createTime":2},
                {"sender":"user","message":"q2","createTime":3},
                {"sender":"bot","message":"a2","createTime":4},
                {"sender":"user","message":"q3","createTime":5}
            ]"#,
        )
        .unwrap();

        let out = root.join("pairs");
        convert(&convert_opts(out.clone(), 10, vec![input]), &SilentProgress).unwrap();

        let set = locate_pairs(&out).unwrap();
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![10, 11, 12, 13]);

        let presence: Vec<_> = set
            .iter()
            .map(|(_, files)| {
                (
                    files.file_name(FileRole::Question).is_some(),
                    files.file_name(FileRole::Answer).is_some(),
                )
            })
            .collect();
        assert_eq!(
            presence,
            vec![(false, true), (true, false), (true, true), (true, false)]
        );
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn merge_writes_document_into_directory() {
        let dir = temp_dir();
        std::fs::write(dir.join("3-1a.md"), "The answer").unwrap();

        let outcome = merge(&merge_opts(dir.clone()), &SilentProgress).unwrap();
        let output_path = dir.join("README.md");
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                output_path: output_path.clone(),
                pair_count: 1
            }
        );

        let doc = std::fs::read_to_string(&output_path).unwrap();
        let label = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(doc.starts_with(&format!("# Conversation Archive\n\nGenerated from {label}\n\n")));
        assert!(doc.contains("## 3. Question\n\n*(Question file missing)*"));
        assert!(doc.contains("## Answer\n\nThe answer\n\n---\n\n"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn merge_empty_directory_is_nothing_to_merge() {
        let dir = temp_dir();
        std::fs::write(dir.join("notes.md"), "unrelated").unwrap();

        let outcome = merge(&merge_opts(dir.clone()), &SilentProgress).unwrap();
        assert_eq!(outcome, MergeOutcome::NothingToMerge);
        assert!(!dir.join("README.md").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn merge_missing_directory_fails() {
        let err = merge(&merge_opts(temp_dir().join("absent")), &SilentProgress).unwrap_err();
        assert!(matches!(err, ConvArchiveError::NotFound { .. }));
    }

    #[test]
    fn merge_refuses_to_overwrite_pair_file() {
        let dir = temp_dir();
        std::fs::write(dir.join("1-0q.md"), "q").unwrap();
        let mut opts = merge_opts(dir.clone());
        opts.output_filename = "1-0q.md".into();

        let err = merge(&opts, &SilentProgress).unwrap_err();
        assert!(matches!(err, ConvArchiveError::Validation { .. }));
        assert_eq!(std::fs::read_to_string(dir.join("1-0q.md")).unwrap(), "q");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn merge_output_stays_inside_directory() {
        let root = temp_dir();
        let dir = root.join("chats");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("1-0q.md"), "q").unwrap();

        let absolute = root.join("escaped.md").to_string_lossy().into_owned();
        for name in [absolute.as_str(), "../rel.md", "sub/out.md", "..", ".", ""] {
            let mut opts = merge_opts(dir.clone());
            opts.output_filename = name.into();
            let err = merge(&opts, &SilentProgress).unwrap_err();
            assert!(
                matches!(err, ConvArchiveError::Validation { .. }),
                "accepted {name:?}"
            );
        }
        assert!(!root.join("escaped.md").exists());
        assert!(!root.join("rel.md").exists());
        assert!(!dir.join("sub").exists());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("README.md"));
        assert!(is_plain_file_name("archive v2.md"));
        assert!(!is_plain_file_name("/tmp/out.md"));
        assert!(!is_plain_file_name("../out.md"));
        assert!(!is_plain_file_name("a/b.md"));
        assert!(!is_plain_file_name("a\\b.md"));
        assert!(!is_plain_file_name("./out.md"));
        assert!(!is_plain_file_name(""));
    }
}
