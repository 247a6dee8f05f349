//! Targeted element snapshot.

use crate::host::NodeId;

/// Class name used to highlight the current target.
///
/// Filtered out of every class list we report, so the system never
/// describes its own marker.
pub const MARKER_CLASS: &str = "pinpoint-highlighted";

/// Number of words kept when truncating element text.
const TEXT_WORDS: usize = 3;

/// Number of words kept per immediate child summary.
const CHILD_SUMMARY_WORDS: usize = 2;

/// A source location tag, `path` plus an optional line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<u32>,
}

impl SourceLocation {
    /// Parse a `path:line` tag. The line suffix is optional; a non-numeric
    /// suffix is treated as part of the path.
    pub fn parse(tag: &str) -> Self {
        if let Some((file, line)) = tag.rsplit_once(':') {
            if let Ok(line) = line.parse::<u32>() {
                return Self {
                    file: file.to_string(),
                    line: Some(line),
                };
            }
        }
        Self {
            file: tag.to_string(),
            line: None,
        }
    }

    /// Line number, defaulting to 1 when the tag carried none.
    pub fn line_or_default(&self) -> u32 {
        self.line.unwrap_or(1)
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}

/// Snapshot of the element currently targeted for prompt generation.
///
/// Created on pointer-move resolution, replaced while previewing, frozen
/// once the selection locks. Holds a non-owning [`NodeId`] back-reference
/// used only to re-query live geometry and marker state.
#[derive(Debug, Clone)]
pub struct TargetedElement {
    pub node: NodeId,
    /// Best-effort component name; falls back to the tag name.
    pub component_name: String,
    pub source_location: Option<SourceLocation>,
    pub tag_name: String,
    /// Class list with the marker class filtered out.
    pub class_names: Vec<String>,
    pub element_id: Option<String>,
    /// First words of the text content, with a `...` suffix when cut.
    pub truncated_text: String,
    /// Number of immediate child elements.
    pub child_count: usize,
    /// First words of each immediate child's text, for content summaries.
    pub child_summaries: Vec<String>,
}

impl TargetedElement {
    /// Class list joined for display, empty string when there are none.
    pub fn joined_classes(&self) -> String {
        self.class_names.join(" ")
    }
}

/// Drop the highlight marker from a class list.
pub fn filter_marker(classes: &[String]) -> Vec<String> {
    classes
        .iter()
        .filter(|c| c.as_str() != MARKER_CLASS && !c.is_empty())
        .cloned()
        .collect()
}

/// Keep the first `TEXT_WORDS` words, appending `...` when truncated.
pub fn truncate_text(text: &str) -> String {
    truncate_words(text, TEXT_WORDS, true)
}

/// Keep the first `CHILD_SUMMARY_WORDS` words of a child's text.
pub fn summarize_child(text: &str) -> String {
    truncate_words(text, CHILD_SUMMARY_WORDS, false)
}

fn truncate_words(text: &str, keep: usize, ellipsis: bool) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out = words.iter().take(keep).copied().collect::<Vec<_>>().join(" ");
    if ellipsis && words.len() > keep {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_location_parses_line() {
        let loc = SourceLocation::parse("/a/b/src/App.jsx:10");
        assert_eq!(loc.file, "/a/b/src/App.jsx");
        assert_eq!(loc.line, Some(10));
        assert_eq!(loc.file_name(), "App.jsx");
    }

    #[test]
    fn source_location_without_line_defaults_to_one() {
        let loc = SourceLocation::parse("/a/b/src/App.jsx");
        assert_eq!(loc.file, "/a/b/src/App.jsx");
        assert_eq!(loc.line, None);
        assert_eq!(loc.line_or_default(), 1);
    }

    #[test]
    fn non_numeric_suffix_stays_in_path() {
        let loc = SourceLocation::parse("C:whatever");
        assert_eq!(loc.file, "C:whatever");
        assert_eq!(loc.line, None);
    }

    #[test]
    fn marker_class_is_filtered() {
        let classes = vec![
            "btn".to_string(),
            MARKER_CLASS.to_string(),
            "primary".to_string(),
        ];
        assert_eq!(filter_marker(&classes), vec!["btn", "primary"]);
    }

    #[test]
    fn truncates_to_three_words_with_ellipsis() {
        assert_eq!(truncate_text("one two three four"), "one two three...");
        assert_eq!(truncate_text("Count: 0"), "Count: 0");
        assert_eq!(truncate_text("   "), "");
    }

    #[test]
    fn child_summary_keeps_two_words() {
        assert_eq!(summarize_child("Add a new item"), "Add a");
        assert_eq!(summarize_child("Clear"), "Clear");
    }
}
