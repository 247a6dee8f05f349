//! Prompt builder.
//!
//! Turns a targeted element plus the user's free text and scope choice
//! into the canonical structured prompt. Pure and deterministic: the same
//! inputs always produce byte-identical output.

use serde::Serialize;

use crate::element::TargetedElement;
use crate::machine::Scope;

/// The assembled prompt, built once per send and never mutated after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub component_name: String,
    pub relative_file_path: String,
    pub line: u32,
    /// Joined class list, omitted from the record when empty.
    pub class_names: Option<String>,
    pub content_summary: Option<String>,
    pub instruction: String,
    pub user_text: Option<String>,
}

/// The JSON record embedded at the end of the prompt. Key order is fixed
/// by field order; omitted keys are entirely absent.
#[derive(Serialize)]
struct PromptRecord<'a> {
    component: &'a str,
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    classes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

impl PromptPayload {
    /// Render the final prompt text: optional user line, blank line,
    /// instruction sentence, blank line, JSON record.
    pub fn render(&self) -> String {
        let mut text = String::new();
        if let Some(user) = &self.user_text {
            text.push_str(user);
            text.push_str("\n\n");
        }
        text.push_str(&self.instruction);
        text.push_str("\n\n");

        let record = PromptRecord {
            component: &self.component_name,
            file: format!("{}:{}", self.relative_file_path, self.line),
            classes: self.class_names.as_deref(),
            content: self.content_summary.as_deref(),
        };
        // Two-space indentation; a struct cannot fail to serialize.
        let json = serde_json::to_string_pretty(&record)
            .unwrap_or_else(|_| String::from("{}"));
        text.push_str(&json);
        text
    }
}

/// Build a prompt for `target`.
///
/// Returns `None` when the target has no source location - there is
/// nothing to anchor an edit to, which callers treat as "not applicable"
/// rather than an error.
pub fn build(target: &TargetedElement, user_text: &str, scope: Scope) -> Option<PromptPayload> {
    let location = target.source_location.as_ref()?;

    let classes = target.joined_classes();
    let class_names = (!classes.is_empty()).then_some(classes);

    let user = user_text.trim();
    let user_text = (!user.is_empty()).then(|| user.to_string());

    Some(PromptPayload {
        component_name: target.component_name.clone(),
        relative_file_path: relativize(&location.file),
        line: location.line_or_default(),
        content_summary: content_summary(target),
        instruction: instruction(scope, class_names.is_some()),
        class_names,
        user_text,
    })
}

/// Normalize an absolute path to a project-relative form around the
/// `/src/` segment: keep the directory immediately before `src/` when
/// there is one, otherwise start at `src/`; with no `/src/` segment keep
/// only the file name.
fn relativize(path: &str) -> String {
    match path.find("/src/") {
        Some(idx) => {
            let before = &path[..idx];
            match before.rfind('/') {
                Some(slash) => path[slash + 1..].to_string(),
                None => path[idx + 1..].to_string(),
            }
        }
        None => path
            .rsplit('/')
            .next()
            .unwrap_or(path)
            .to_string(),
    }
}

/// Summarize what the element contains: child-element count when it has
/// children (annotated with the first words of each child), else its
/// truncated text.
fn content_summary(target: &TargetedElement) -> Option<String> {
    if target.child_count > 0 {
        let noun = if target.child_count == 1 {
            "element"
        } else {
            "elements"
        };
        let mut summary = format!("{} {}", target.child_count, noun);
        if !target.child_summaries.is_empty() {
            summary.push_str(&format!(" [{}]", target.child_summaries.join(", ")));
        }
        return Some(summary);
    }
    if !target.truncated_text.is_empty() {
        return Some(target.truncated_text.clone());
    }
    None
}

fn instruction(scope: Scope, has_classes: bool) -> String {
    match scope {
        Scope::AllSimilar if has_classes => {
            "Apply this to all similar elements using the class.".to_string()
        }
        Scope::AllSimilar => "Apply this to all similar elements.".to_string(),
        Scope::OnlyThis => "Apply this to this element only.".to_string(),
    }
}
