//! Markdown heading normalization for merged conversation archives.
//!
//! Question and answer fragments are nested under `## ...` sections of the
//! merged document, so their own headings must sit at least one level deeper.
//! [`demote_headers`] shifts a fragment's headings uniformly, preserving the
//! relative nesting the author wrote.

mod headings;

use tracing::trace;

/// Depth a fragment's shallowest heading is pushed to by default.
pub const DEFAULT_TARGET_DEPTH: usize = 3;

/// Shallowest heading level in `md`, ignoring fenced code. `None` when the
/// fragment has no headings.
pub fn min_heading_level(md: &str) -> Option<usize> {
    headings::scan(md)
        .iter()
        .filter_map(|line| line.heading_level)
        .min()
}

/// Push every heading in `md` deeper so the shallowest sits at `target`.
///
/// The shift is computed from this fragment alone. Fragments without
/// headings, or whose shallowest heading is already at or below `target`,
/// come back unchanged. Applying this twice equals applying it once.
pub fn demote_headers(md: &str, target: usize) -> String {
    let Some(min_level) = min_heading_level(md) else {
        return md.to_string();
    };

    if min_level >= target {
        return md.to_string();
    }

    let lines = headings::scan(md);

    let shift = target - min_level;
    trace!(min_level, target, shift, "demoting headings");

    let extra = "#".repeat(shift);
    let mut result = String::with_capacity(md.len() + extra.len() * lines.len());

    for line in &lines {
        if line.heading_level.is_some() {
            result.push_str(&extra);
        }
        result.push_str(line.body);
        result.push_str(line.ending);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_headings_unchanged() {
        let md = "Just a paragraph.\n\n- a list\n";
        assert_eq!(demote_headers(md, 3), md);
        assert_eq!(min_heading_level(md), None);
    }

    #[test]
    fn already_deep_enough_unchanged() {
        let md = "### Setup\n\nText\n\n#### Detail";
        assert_eq!(demote_headers(md, 3), md);
    }

    #[test]
    fn shifts_uniformly_preserving_nesting() {
        let md = "# Title\n\nIntro\n\n## Section\n\n### Sub";
        assert_eq!(
            demote_headers(md, 3),
            "### Title\n\nIntro\n\n#### Section\n\n##### Sub"
        );
    }

    #[test]
    fn shift_comes_from_shallowest_heading() {
        let md = "## Overview\n#### Deep";
        assert_eq!(demote_headers(md, 3), "### Overview\n##### Deep");
    }

    #[test]
    fn each_fragment_shifts_independently() {
        let first = demote_headers("# One", 3);
        let second = demote_headers("## Two", 3);
        assert_eq!(first, "### One");
        assert_eq!(second, "### Two");
    }

    #[test]
    fn demotion_is_idempotent() {
        let inputs = [
            "# A\n## B\ntext",
            "## only\n",
            "plain text",
            "#### deep\n# shallow",
            "```\n# code\n```\n# heading",
        ];
        for md in inputs {
            let once = demote_headers(md, 3);
            let twice = demote_headers(&once, 3);
            assert_eq!(once, twice, "not idempotent for {md:?}");
        }
    }

    #[test]
    fn non_heading_hashes_untouched() {
        let md = "# Title\n#hashtag stays\nissue #42";
        assert_eq!(demote_headers(md, 3), "### Title\n#hashtag stays\nissue #42");
    }

    #[test]
    fn fenced_code_untouched() {
        let md = "# Script\n\n```sh\n# install deps\nmake\n```";
        assert_eq!(
            demote_headers(md, 3),
            "### Script\n\n```sh\n# install deps\nmake\n```"
        );
    }

    #[test]
    fn inline_code_with_triple_backticks_is_not_a_fence() {
        let md = "# Title\n```js``` is inline\n# Second";
        assert_eq!(
            demote_headers(md, 3),
            "### Title\n```js``` is inline\n### Second"
        );
        assert_eq!(min_heading_level("```x``` y\n## Only"), Some(2));
    }

    #[test]
    fn crlf_endings_preserved() {
        let md = "# A\r\nbody\r\n";
        assert_eq!(demote_headers(md, 3), "### A\r\nbody\r\n");
    }

    #[test]
    fn custom_target_depth() {
        assert_eq!(demote_headers("# A", DEFAULT_TARGET_DEPTH), "### A");
        assert_eq!(demote_headers("# A\n## B", 2), "## A\n### B");
        assert_eq!(demote_headers("# A", 1), "# A");
    }
}
