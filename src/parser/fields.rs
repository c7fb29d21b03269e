/// Lines of a single flat-file field (`NAME`, `DEFINITION`, ...): the header
/// remainder plus indented continuation lines, up to the next header.
pub fn field_lines(text: &str, field: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut collecting = false;

    for line in text.lines() {
        if let Some(rest) = strip_field(line, field) {
            collecting = true;
            out.push(rest.trim().to_string());
        } else if collecting {
            if line.starts_with(char::is_whitespace) {
                out.push(line.trim().to_string());
            } else {
                break;
            }
        }
    }

    out.retain(|l| !l.is_empty());
    out
}

/// Compound names from a `NAME` field; entries are `;`-separated and may
/// span lines.
pub fn compound_names(text: &str) -> Vec<String> {
    field_lines(text, "NAME")
        .iter()
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

/// First line of the `NAME` field, or empty.
pub fn pathway_name(text: &str) -> String {
    field_lines(text, "NAME")
        .into_iter()
        .next()
        .unwrap_or_default()
}

fn strip_field<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?;
    // "NAME" must not match "NAMESPACE"
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_fixture_names() {
        let text = std::fs::read_to_string("tests/fixtures/cpd_C02094.txt").unwrap();
        let names = compound_names(&text);
        assert_eq!(names[0], "beta-Carotene");
        assert!(names.contains(&"beta,beta-Carotene".to_string()));
        assert!(names.contains(&"Provitamin A".to_string()));
    }

    #[test]
    fn pathway_fixture_name() {
        let text = std::fs::read_to_string("tests/fixtures/map00906.txt").unwrap();
        assert_eq!(pathway_name(&text), "Carotenoid biosynthesis");
    }

    #[test]
    fn field_stops_at_next_header() {
        let text = "NAME        a;\n            b\nFORMULA     C40H56\n            not a name";
        assert_eq!(field_lines(text, "NAME"), vec!["a;", "b"]);
    }

    #[test]
    fn missing_field_is_empty() {
        assert!(field_lines("ENTRY  C1", "NAME").is_empty());
        assert_eq!(pathway_name(""), "");
    }

    #[test]
    fn prefix_of_longer_keyword_does_not_match() {
        assert!(field_lines("NAMESPACE   x", "NAME").is_empty());
    }
}
