//! Checklist-as-text encoding
//!
//! List notes mirror their items into `content` as one line per item,
//! `[x] Milk` / `[ ] Bread`. Older records only carry this text form.
//! Parsing is manual; the grammar per line is
//! `[bullet] [box] text` where both prefixes are optional.

use crate::api::{ListItem, RecordId};
use uuid::Uuid;

const BULLETS: &[char] = &['-', '*', '•'];

/// One parsed checklist line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistLine<'a> {
    pub checked: bool,
    pub text: &'a str,
}

/// Parse one line; `None` for blank lines
pub fn parse_line(line: &str) -> Option<ChecklistLine<'_>> {
    let mut rest = line.trim();
    if rest.is_empty() {
        return None;
    }

    if let Some(stripped) = rest.strip_prefix(BULLETS) {
        if stripped.starts_with(char::is_whitespace) || stripped.starts_with('[') {
            rest = stripped.trim_start();
        }
    }

    let (checked, text) = strip_checkbox(rest);
    Some(ChecklistLine {
        checked,
        text: text.trim(),
    })
}

fn strip_checkbox(s: &str) -> (bool, &str) {
    for (marker, checked) in [
        ("[ ]", false),
        ("[]", false),
        ("[x]", true),
        ("[X]", true),
        ("☐", false),
        ("☑", true),
        ("☒", true),
    ] {
        if let Some(rest) = s.strip_prefix(marker) {
            return (checked, rest);
        }
    }
    (false, s)
}

/// Whether `content` is a plain-text checklist: at least one non-blank
/// line and every non-blank line matches the line grammar.
pub fn is_checklist_text(content: &str) -> bool {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty()).peekable();
    lines.peek().is_some() && lines.all(|l| parse_line(l).is_some())
}

/// Parse checklist text into items with freshly generated ids
pub fn parse_checklist_text(content: &str) -> Vec<ListItem> {
    content
        .lines()
        .filter_map(parse_line)
        .filter(|line| !line.text.is_empty())
        .map(|line| ListItem {
            id: RecordId::Text(Uuid::new_v4().to_string()),
            text: line.text.to_string(),
            checked: line.checked,
        })
        .collect()
}

/// Render items as checklist text, one `[x]`/`[ ]` line per item
pub fn to_checklist_text(items: &[ListItem]) -> String {
    items
        .iter()
        .map(|item| {
            let mark = if item.checked { "[x]" } else { "[ ]" };
            format!("{} {}", mark, item.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
