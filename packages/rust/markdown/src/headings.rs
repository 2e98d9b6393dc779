//! Line scanner that finds ATX heading markers outside fenced code blocks.

use std::sync::LazyLock;

use regex::Regex;

/// A single line of a fragment, split from its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScannedLine<'a> {
    /// Line text without `\n` / `\r\n`.
    pub body: &'a str,
    /// The original terminator (empty on the final unterminated line).
    pub ending: &'a str,
    /// Length of the `#` run when the line is a heading.
    pub heading_level: Option<usize>,
}

/// Split `md` into lines and tag each heading with its level.
///
/// Lines inside ```` ``` ```` or `~~~` fences are never headings, so shell
/// comments and similar in code samples survive untouched.
pub(crate) fn scan(md: &str) -> Vec<ScannedLine<'_>> {
    let mut lines = Vec::new();
    let mut fence: Option<Fence> = None;

    for raw in md.split_inclusive('\n') {
        let (body, ending) = split_ending(raw);

        let heading_level = match fence {
            Some(open) => {
                if open.closed_by(body) {
                    fence = None;
                }
                None
            }
            None => {
                if let Some(open) = Fence::opened_by(body) {
                    fence = Some(open);
                    None
                } else {
                    heading_level(body)
                }
            }
        };

        lines.push(ScannedLine {
            body,
            ending,
            heading_level,
        });
    }

    lines
}

/// Level of the heading marker at the start of `line`, if it is one.
///
/// A marker is one or more `#` followed by a space, a tab, or end of line.
pub(crate) fn heading_level(line: &str) -> Option<usize> {
    static MARKER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#+)(?:[ \t]|$)").expect("valid regex"));

    MARKER_RE.captures(line).map(|caps| caps[1].len())
}

fn split_ending(raw: &str) -> (&str, &str) {
    let body_len = raw
        .strip_suffix("\r\n")
        .or_else(|| raw.strip_suffix('\n'))
        .map_or(raw.len(), str::len);
    raw.split_at(body_len)
}

/// An open code fence: its marker character and run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn opened_by(line: &str) -> Option<Self> {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return None;
        }
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        // A backtick info string cannot hold a backtick; such a line is inline code.
        let info = &trimmed[len..];
        if len < 3 || (marker == '`' && info.contains('`')) {
            return None;
        }
        Some(Self { marker, len })
    }

    fn closed_by(self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.len() >= self.len && trimmed.chars().all(|c| c == self.marker)
    }
}
