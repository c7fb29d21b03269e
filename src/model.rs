use serde::Serialize;

/// Entity categories a pathway record is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Enzyme,
    Reaction,
    Compound,
    Gene,
}

impl Category {
    /// Report order. Also the order of CSV files and summary lines.
    pub const ALL: [Category; 4] = [
        Category::Enzyme,
        Category::Reaction,
        Category::Compound,
        Category::Gene,
    ];

    /// Section header keyword → category. The only place headers are named.
    const HEADERS: &'static [(&'static str, Category)] = &[
        ("ENZYME", Category::Enzyme),
        ("REACTION", Category::Reaction),
        ("COMPOUND", Category::Compound),
        ("GENE", Category::Gene),
    ];

    /// Case-insensitive header lookup.
    pub fn from_header(keyword: &str) -> Option<Category> {
        Self::HEADERS
            .iter()
            .find(|(kw, _)| kw.eq_ignore_ascii_case(keyword))
            .map(|(_, c)| *c)
    }

    pub fn header(self) -> &'static str {
        Self::HEADERS
            .iter()
            .find(|(_, c)| *c == self)
            .map(|(kw, _)| *kw)
            .unwrap_or_default()
    }

    pub fn csv_file(self) -> &'static str {
        match self {
            Category::Enzyme => "pathway_enzymes.csv",
            Category::Reaction => "pathway_reactions.csv",
            Category::Compound => "pathway_compounds.csv",
            Category::Gene => "pathway_genes.csv",
        }
    }

    pub fn report_label(self) -> &'static str {
        match self {
            Category::Enzyme => "Enzymes",
            Category::Reaction => "Reactions",
            Category::Compound => "Compounds",
            Category::Gene => "Genes lines",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub category: Category,
    pub identifier: String,
    pub display_name: String,
    pub cross_reference: Option<String>,
}

/// Raw flat-file text of one KEGG entry.
#[derive(Debug, Clone)]
pub struct PathwayRecord {
    pub entry_id: String,
    pub text: String,
}

impl PathwayRecord {
    pub fn new(entry_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            text: text.into(),
        }
    }
}

// ── Tests ──
