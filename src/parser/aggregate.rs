use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::entities::parse_line;
use super::sections::Section;
use crate::model::{Category, EntityRecord};

/// Per-category entity lists for one record, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    entities: BTreeMap<Category, Vec<EntityRecord>>,
    /// Section lines skipped for lacking an identifier.
    pub unparsed: usize,
}

impl ExtractionResult {
    /// All four categories present, all counts zero.
    pub fn empty() -> Self {
        Self {
            entities: Category::ALL.iter().map(|c| (*c, Vec::new())).collect(),
            unparsed: 0,
        }
    }

    pub fn entities(&self, category: Category) -> &[EntityRecord] {
        self.entities
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn count(&self, category: Category) -> usize {
        self.entities(category).len()
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    /// (category, count) in report order.
    pub fn counts(&self) -> Vec<(Category, usize)> {
        Category::ALL.iter().map(|c| (*c, self.count(*c))).collect()
    }
}

/// Parse every section line and keep the first occurrence of each
/// (category, identifier).
pub fn aggregate(sections: &[Section]) -> ExtractionResult {
    let mut result = ExtractionResult::empty();
    let mut seen: HashSet<(Category, String)> = HashSet::new();

    for section in sections {
        for line in &section.lines {
            let Some(entity) = parse_line(line, section.category) else {
                result.unparsed += 1;
                continue;
            };
            if !seen.insert((entity.category, entity.identifier.clone())) {
                continue;
            }
            result
                .entities
                .entry(entity.category)
                .or_default()
                .push(entity);
        }
    }

    result
}

// ── Tests ──
