use serde::Deserialize;

use crate::model::Category;

const RECORD_END: &str = "///";

#[derive(Debug, Clone)]
pub struct Section {
    pub category: Category,
    pub lines: Vec<String>,
}

/// What an unrecognized header does to the open section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Header is ignored; its lines join the open section.
    #[default]
    Lenient,
    /// Header closes the open section; its lines are dropped.
    Strict,
}

impl std::str::FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(SplitMode::Lenient),
            "strict" => Ok(SplitMode::Strict),
            other => Err(format!("unknown split mode: {other}")),
        }
    }
}

/// Split a flat-file record into category sections by header keyword.
pub fn split_sections(text: &str, mode: SplitMode) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current_lines: Vec<String> = Vec::new();
    let mut current: Option<Category> = None;

    for line in text.lines() {
        if line.trim_end() == RECORD_END {
            flush(&mut sections, current.take(), &mut current_lines);
            continue;
        }

        match detect_header(line) {
            Some((keyword, rest)) => match Category::from_header(keyword) {
                Some(category) => {
                    flush(&mut sections, current.take(), &mut current_lines);
                    current = Some(category);
                    push_rest(&mut current_lines, rest);
                }
                None => match mode {
                    SplitMode::Lenient if current.is_some() => {
                        push_rest(&mut current_lines, rest);
                    }
                    SplitMode::Lenient => {}
                    SplitMode::Strict => {
                        flush(&mut sections, current.take(), &mut current_lines);
                    }
                },
            },
            // Continuation line
            None if current.is_some() => current_lines.push(line.to_string()),
            None => {}
        }
    }

    flush(&mut sections, current, &mut current_lines);
    sections
}

/// A header starts in column 0. Returns (keyword, remainder of the line).
fn detect_header(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() || line.starts_with(char::is_whitespace) {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => Some((keyword, rest)),
        None => Some((line, "")),
    }
}

fn push_rest(lines: &mut Vec<String>, rest: &str) {
    let rest = rest.trim();
    if !rest.is_empty() {
        lines.push(rest.to_string());
    }
}

fn flush(sections: &mut Vec<Section>, category: Option<Category>, lines: &mut Vec<String>) {
    if let Some(category) = category {
        sections.push(Section {
            category,
            lines: std::mem::take(lines),
        });
    }
    lines.clear();
}

// ── Tests ──
