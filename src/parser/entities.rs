use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{Category, EntityRecord};

static BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").unwrap());
static XREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2,5}:\s?\S").unwrap());

/// Parse one section line: identifier, then display name, then optional
/// database cross-references (`[EC:...]`, `; EC:...`).
/// Returns None when the line has no usable identifier.
pub fn parse_line(line: &str, category: Category) -> Option<EntityRecord> {
    let line = line.trim();
    let (identifier, rest) = match line.split_once(char::is_whitespace) {
        Some((id, rest)) => (id, rest.trim()),
        None => (line, ""),
    };
    if !identifier.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return None;
    }

    let mut xrefs: Vec<String> = BRACKET_RE
        .captures_iter(rest)
        .map(|caps| collapse(&caps[1]))
        .filter(|inner| is_xref(inner))
        .collect();

    let unbracketed = BRACKET_RE.replace_all(rest, |caps: &Captures| {
        if is_xref(caps[1].trim()) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    let mut name_parts = Vec::new();
    for segment in unbracketed.split(';').map(collapse).filter(|s| !s.is_empty()) {
        if is_xref(&segment) {
            xrefs.push(segment);
        } else {
            name_parts.push(segment);
        }
    }

    Some(EntityRecord {
        category,
        identifier: identifier.to_string(),
        display_name: name_parts.join("; "),
        cross_reference: if xrefs.is_empty() {
            None
        } else {
            Some(xrefs.join("; "))
        },
    })
}

fn is_xref(s: &str) -> bool {
    XREF_RE.is_match(s)
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
