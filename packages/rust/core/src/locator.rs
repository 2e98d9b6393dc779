//! Pair-file discovery across naming conventions.
//!
//! Recognized names live in [`PATTERNS`]; supporting another convention
//! means adding a row there.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument, warn};

use convarchive_shared::{
    ConvArchiveError, FileRole, NamingConvention, PairFile, PairFileSet, Result,
};

/// One accepted file-name pattern. The first capture group is the id.
pub struct FilePattern {
    pub regex: Regex,
    pub role: FileRole,
    pub convention: NamingConvention,
}

impl FilePattern {
    fn new(pattern: &str, role: FileRole, convention: NamingConvention) -> Self {
        Self {
            regex: Regex::new(pattern).expect("valid regex"),
            role,
            convention,
        }
    }
}

/// Accepted pair-file names, tried in order.
pub static PATTERNS: LazyLock<Vec<FilePattern>> = LazyLock::new(|| {
    vec![
        FilePattern::new(r"^(\d+)-0q\.md$", FileRole::Question, NamingConvention::Current),
        FilePattern::new(r"^(\d+)-1a\.md$", FileRole::Answer, NamingConvention::Current),
        FilePattern::new(r"^(\d+)-q\.md$", FileRole::Question, NamingConvention::Legacy),
        FilePattern::new(r"^(\d+)-a\.md$", FileRole::Answer, NamingConvention::Legacy),
    ]
});

/// A file name recognized as one side of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub id: u64,
    pub role: FileRole,
    pub convention: NamingConvention,
}

/// Match `name` against [`PATTERNS`]. Ids too large for `u64` are rejected.
pub fn classify(name: &str) -> Option<Classified> {
    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(name)?;
        let id = match caps[1].parse::<u64>() {
            Ok(id) => id,
            Err(e) => {
                debug!(name, error = %e, "pair id out of range");
                return None;
            }
        };
        Some(Classified {
            id,
            role: pattern.role,
            convention: pattern.convention,
        })
    })
}

/// Whether `name` follows either pair-file convention.
pub fn is_pair_file_name(name: &str) -> bool {
    classify(name).is_some()
}

/// Scan `dir` and group its pair files by id.
///
/// Only regular files are considered. When a side of an id is named under
/// both conventions, the current convention's file is used.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn locate_pairs(dir: &Path) -> Result<PairFileSet> {
    if !dir.is_dir() {
        return Err(ConvArchiveError::not_found(dir));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ConvArchiveError::io(dir, e))?;
    let mut set = PairFileSet::new();

    for entry in entries {
        let entry = entry.map_err(|e| ConvArchiveError::io(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(found) = classify(&name) else {
            continue;
        };
        if !entry.path().is_file() {
            debug!(name, "skipping non-file entry with a pair-file name");
            continue;
        }

        let accepted = set.insert(
            found.id,
            found.role,
            PairFile {
                name: name.clone(),
                convention: found.convention,
            },
        );
        if !accepted {
            warn!(name, id = found.id, "ignoring legacy file shadowed by current name");
        }
    }

    debug!(ids = set.len(), "pair files located");
    Ok(set)
}
