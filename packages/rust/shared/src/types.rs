//! Core domain types for convarchive transcripts and pair files.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Speaker of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Any sender label not recognized below. Skipped when pairing.
    Unknown,
}

impl Role {
    /// Classify a source-provided sender/role label, ignoring case.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "human" | "user" => Self::User,
            "assistant" | "model" | "bot" => Self::Assistant,
            _ => Self::Unknown,
        }
    }

    /// Lowercase label, stable across runs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A normalized transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Stable message/response identifier, when the source supplied one.
    pub identity: Option<String>,
    /// Creation time; the Unix epoch when absent or unparsable.
    pub timestamp: DateTime<Utc>,
    /// Normalized speaker.
    pub role: Role,
    /// Raw text body. May be empty.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

/// One question/answer unit. At least one side is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    /// Sequential number, also the numeric part of the pair's file names.
    pub index: u64,
    question: Option<String>,
    answer: Option<String>,
}

impl Pair {
    /// A question followed by its answer.
    pub fn complete(index: u64, question: String, answer: String) -> Self {
        Self {
            index,
            question: Some(question),
            answer: Some(answer),
        }
    }

    /// A question that never received an answer.
    pub fn unanswered(index: u64, question: String) -> Self {
        Self {
            index,
            question: Some(question),
            answer: None,
        }
    }

    /// An answer with no preceding question.
    pub fn orphan(index: u64, answer: String) -> Self {
        Self {
            index,
            question: None,
            answer: Some(answer),
        }
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Pair file naming
// ---------------------------------------------------------------------------

/// File name of a pair's question under the current convention (`<id>-0q.md`).
pub fn question_file_name(index: u64) -> String {
    format!("{index}-0q.md")
}

/// File name of a pair's answer under the current convention (`<id>-1a.md`).
pub fn answer_file_name(index: u64) -> String {
    format!("{index}-1a.md")
}

/// Which side of a pair a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Question,
    Answer,
}

/// Historical pair-file naming schemes.
///
/// Ordered by preference: when both schemes name the same side of the same
/// id, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    /// `<id>-0q.md` / `<id>-1a.md`
    Current,
    /// `<id>-q.md` / `<id>-a.md`
    Legacy,
}

/// A located pair file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairFile {
    /// File name relative to the scanned directory.
    pub name: String,
    /// Scheme the name matched.
    pub convention: NamingConvention,
}

/// The question and answer files found for one id. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairFiles {
    pub question: Option<PairFile>,
    pub answer: Option<PairFile>,
}

impl PairFiles {
    /// File name for one side, if present.
    pub fn file_name(&self, role: FileRole) -> Option<&str> {
        self.slot(role).as_ref().map(|f| f.name.as_str())
    }

    fn slot(&self, role: FileRole) -> &Option<PairFile> {
        match role {
            FileRole::Question => &self.question,
            FileRole::Answer => &self.answer,
        }
    }

    fn slot_mut(&mut self, role: FileRole) -> &mut Option<PairFile> {
        match role {
            FileRole::Question => &mut self.question,
            FileRole::Answer => &mut self.answer,
        }
    }
}

/// Pair files discovered in a directory, keyed by numeric id.
///
/// Iteration is in ascending numeric id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairFileSet {
    pairs: BTreeMap<u64, PairFiles>,
}

impl PairFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file for `id`. Returns `false` when the slot already holds a
    /// file from a preferred (or the same) convention and `file` was dropped.
    pub fn insert(&mut self, id: u64, role: FileRole, file: PairFile) -> bool {
        let slot = self.pairs.entry(id).or_default().slot_mut(role);
        let replace = match slot.as_ref() {
            Some(existing) => file.convention < existing.convention,
            None => true,
        };
        if replace {
            *slot = Some(file);
        }
        replace
    }

    pub fn get(&self, id: u64) -> Option<&PairFiles> {
        self.pairs.get(&id)
    }

    /// Ids in ascending numeric order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.pairs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &PairFiles)> {
        self.pairs.iter().map(|(id, files)| (*id, files))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, convention: NamingConvention) -> PairFile {
        PairFile {
            name: name.into(),
            convention,
        }
    }

    #[test]
    fn role_labels_are_case_insensitive() {
        assert_eq!(Role::from_label("Human"), Role::User);
        assert_eq!(Role::from_label("USER"), Role::User);
        assert_eq!(Role::from_label("assistant"), Role::Assistant);
        assert_eq!(Role::from_label("Model"), Role::Assistant);
        assert_eq!(Role::from_label("bot"), Role::Assistant);
        assert_eq!(Role::from_label("system"), Role::Unknown);
        assert_eq!(Role::from_label(""), Role::Unknown);
    }

    #[test]
    fn file_names_follow_current_convention() {
        assert_eq!(question_file_name(5), "5-0q.md");
        assert_eq!(answer_file_name(12), "12-1a.md");
    }

    #[test]
    fn pair_constructors_set_sides() {
        let p = Pair::orphan(3, "Hello".into());
        assert_eq!(p.question(), None);
        assert_eq!(p.answer(), Some("Hello"));

        let p = Pair::unanswered(4, String::new());
        assert_eq!(p.question(), Some(""));
        assert_eq!(p.answer(), None);
    }

    #[test]
    fn ids_iterate_numerically() {
        let mut set = PairFileSet::new();
        for id in [10, 2, 1] {
            set.insert(id, FileRole::Question, file(&format!("{id}-0q.md"), NamingConvention::Current));
        }
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![1, 2, 10]);
    }

    #[test]
    fn current_convention_wins_conflicts() {
        let mut set = PairFileSet::new();
        assert!(set.insert(7, FileRole::Answer, file("7-a.md", NamingConvention::Legacy)));
        assert!(set.insert(7, FileRole::Answer, file("7-1a.md", NamingConvention::Current)));
        assert!(!set.insert(7, FileRole::Answer, file("7-a.md", NamingConvention::Legacy)));

        let files = set.get(7).unwrap();
        assert_eq!(files.file_name(FileRole::Answer), Some("7-1a.md"));
        assert_eq!(files.file_name(FileRole::Question), None);
    }
}
