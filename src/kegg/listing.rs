use regex::Regex;

use crate::error::{ExpertError, Result};

/// `/find` output: `<id>\t<description>` per line.
pub fn parse_find_hits(text: &str) -> Vec<(String, String)> {
    parse_pairs(text)
}

/// `/link` output: `<source>\t<target>` per line.
pub fn parse_link_pairs(text: &str) -> Vec<(String, String)> {
    parse_pairs(text)
}

fn parse_pairs(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once('\t'))
        .map(|(a, b)| (a.trim().to_string(), b.trim().to_string()))
        .collect()
}

/// Prefer a hit whose description contains the query as a whole word,
/// otherwise the first hit.
pub fn choose_best_compound_id(query: &str, hits: &[(String, String)]) -> Result<String> {
    let q = query.trim().to_lowercase();
    let re = Regex::new(&format!(r"\b{}\b", regex::escape(&q)));

    if let Ok(re) = re {
        if let Some((id, _)) = hits.iter().find(|(_, desc)| re.is_match(&desc.to_lowercase())) {
            return Ok(id.clone());
        }
    }

    hits.first()
        .map(|(id, _)| id.clone())
        .ok_or_else(|| ExpertError::NoCompoundHits(query.to_string()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn hits() -> Vec<(String, String)> {
        parse_find_hits(
            "cpd:C05433\talpha-Carotene; beta,epsilon-Carotene\n\
             cpd:C02094\tbeta-Carotene; beta,beta-Carotene; Provitamin A\n\
             cpd:C08591\tbeta-Carotene 5,6-epoxide\n",
        )
    }

    #[test]
    fn find_output_parses() {
        let h = hits();
        assert_eq!(h.len(), 3);
        assert_eq!(h[1].0, "cpd:C02094");
        assert!(h[1].1.starts_with("beta-Carotene"));
    }

    #[test]
    fn blank_and_untabbed_lines_are_skipped() {
        let pairs = parse_link_pairs("path:map00906\tsce:YPL117C\n\nno tab here\n");
        assert_eq!(pairs, vec![("path:map00906".to_string(), "sce:YPL117C".to_string())]);
    }

    #[test]
    fn whole_word_match_wins() {
        assert_eq!(choose_best_compound_id("beta-carotene", &hits()).unwrap(), "cpd:C02094");
        assert_eq!(choose_best_compound_id("Provitamin A", &hits()).unwrap(), "cpd:C02094");
    }

    #[test]
    fn falls_back_to_first_hit() {
        assert_eq!(choose_best_compound_id("carotenoid", &hits()).unwrap(), "cpd:C05433");
    }

    #[test]
    fn no_hits_is_an_error() {
        let err = choose_best_compound_id("unobtainium", &[]).unwrap_err();
        assert!(matches!(err, ExpertError::NoCompoundHits(q) if q == "unobtainium"));
    }
}
