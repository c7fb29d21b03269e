use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::model::{Category, EntityRecord};
use crate::parser::aggregate::ExtractionResult;

const ENTITY_HEADER: [&str; 3] = ["id", "name", "cross_reference"];
const SUMMARY_NAMES: usize = 20;
const REPORT_NAMES: usize = 10;

/// Everything the summary and Markdown report need about one run.
pub struct ReportContext<'a> {
    pub product: &'a str,
    pub compound_id: &'a str,
    pub compound_names: &'a [String],
    pub pathway_id: &'a str,
    pub pathway_name: &'a str,
    pub result: &'a ExtractionResult,
}

#[derive(Serialize)]
struct EntityRow<'a> {
    id: &'a str,
    name: &'a str,
    cross_reference: Option<&'a str>,
}

impl<'a> From<&'a EntityRecord> for EntityRow<'a> {
    fn from(e: &'a EntityRecord) -> Self {
        Self {
            id: &e.identifier,
            name: &e.display_name,
            cross_reference: e.cross_reference.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    product_query: &'a str,
    compound_id: &'a str,
    compound_names: String,
    pathway_id: &'a str,
    pathway_name: &'a str,
}

pub fn ensure_outdir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// One CSV per category. Empty categories still get a header row.
pub fn write_entity_csvs(outdir: &Path, result: &ExtractionResult) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let path = outdir.join(category.csv_file());
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        wtr.write_record(ENTITY_HEADER)?;
        for entity in result.entities(category) {
            wtr.serialize(EntityRow::from(entity))?;
        }
        wtr.flush()?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_summary_csv(outdir: &Path, ctx: &ReportContext) -> Result<PathBuf> {
    let path = outdir.join("summary.csv");
    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.serialize(SummaryRow {
        product_query: ctx.product,
        compound_id: ctx.compound_id,
        compound_names: head(ctx.compound_names, SUMMARY_NAMES).join("; "),
        pathway_id: ctx.pathway_id,
        pathway_name: ctx.pathway_name,
    })?;
    wtr.flush()?;
    Ok(path)
}

pub fn write_raw(outdir: &Path, file_name: &str, text: &str) -> Result<PathBuf> {
    let path = outdir.join(file_name);
    std::fs::write(&path, text)?;
    Ok(path)
}

pub fn render_markdown(ctx: &ReportContext) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# KEGG Expert System Demo: {}\n", ctx.product);
    let _ = writeln!(md, "- Compound: **{}**", ctx.compound_id);
    if !ctx.compound_names.is_empty() {
        let _ = writeln!(md, "- Names: {}", head(ctx.compound_names, REPORT_NAMES).join(", "));
    }
    let _ = writeln!(md, "- Pathway: **{}** {}\n", ctx.pathway_id, ctx.pathway_name);
    let _ = writeln!(md, "## Parsed Items\n");
    for (category, count) in ctx.result.counts() {
        let _ = writeln!(
            md,
            "- {} (n={}): saved to `{}`",
            category.report_label(),
            count,
            category.csv_file()
        );
    }
    if ctx.result.unparsed > 0 {
        let _ = writeln!(md, "- Unparsed lines: {}", ctx.result.unparsed);
    }
    md
}

pub fn write_markdown(outdir: &Path, ctx: &ReportContext) -> Result<PathBuf> {
    let path = outdir.join("report.md");
    std::fs::write(&path, render_markdown(ctx))?;
    Ok(path)
}

fn head(names: &[String], n: usize) -> &[String] {
    &names[..names.len().min(n)]
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PathwayRecord;
    use crate::parser::extract_record;
    use crate::parser::sections::SplitMode;

    fn names() -> Vec<String> {
        vec!["beta-Carotene".into(), "beta,beta-Carotene".into()]
    }

    #[test]
    fn markdown_for_empty_result() {
        let result = ExtractionResult::empty();
        let names = names();
        let ctx = ReportContext {
            product: "beta-carotene",
            compound_id: "cpd:C02094",
            compound_names: &names,
            pathway_id: "path:map00906",
            pathway_name: "Carotenoid biosynthesis",
            result: &result,
        };
        let expected = "\
# KEGG Expert System Demo: beta-carotene

- Compound: **cpd:C02094**
- Names: beta-Carotene, beta,beta-Carotene
- Pathway: **path:map00906** Carotenoid biosynthesis

## Parsed Items

- Enzymes (n=0): saved to `pathway_enzymes.csv`
- Reactions (n=0): saved to `pathway_reactions.csv`
- Compounds (n=0): saved to `pathway_compounds.csv`
- Genes lines (n=0): saved to `pathway_genes.csv`
";
        assert_eq!(render_markdown(&ctx), expected);
    }

    #[test]
    fn markdown_omits_names_and_reports_unparsed() {
        let record = PathwayRecord::new("t", "GENE        AT1G  crtB\n            \n");
        let result = extract_record(&record, SplitMode::Lenient);
        let ctx = ReportContext {
            product: "x",
            compound_id: "cpd:C1",
            compound_names: &[],
            pathway_id: "path:map1",
            pathway_name: "",
            result: &result,
        };
        let md = render_markdown(&ctx);
        assert!(!md.contains("- Names:"));
        assert!(md.contains("- Genes lines (n=1): saved to `pathway_genes.csv`"));
        assert!(md.ends_with("- Unparsed lines: 1\n"));
    }

    #[test]
    fn csvs_written_for_every_category() {
        let dir = tempfile::tempdir().unwrap();
        let text = std::fs::read_to_string("tests/fixtures/ath00906.txt").unwrap();
        let result = extract_record(&PathwayRecord::new("path:ath00906", text), SplitMode::Strict);

        let files = write_entity_csvs(dir.path(), &result).unwrap();
        assert_eq!(files.len(), 4);

        let enzymes = std::fs::read_to_string(dir.path().join("pathway_enzymes.csv")).unwrap();
        assert_eq!(enzymes, "id,name,cross_reference\n");

        let mut rdr = csv::Reader::from_path(dir.path().join("pathway_genes.csv")).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 13);
        assert_eq!(&rows[0][0], "AT5G17230");
        assert_eq!(&rows[0][1], "PSY; phytoene synthase");
        assert_eq!(&rows[0][2], "KO:K02291; EC:2.5.1.32 2.5.1.99");

        let compounds = std::fs::read_to_string(dir.path().join("pathway_compounds.csv")).unwrap();
        assert!(compounds.lines().nth(1).unwrap().starts_with("C00353,Geranylgeranyl diphosphate,"));
    }

    #[test]
    fn summary_caps_names() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExtractionResult::empty();
        let many: Vec<String> = (0..30).map(|i| format!("n{}", i)).collect();
        let ctx = ReportContext {
            product: "beta-carotene",
            compound_id: "cpd:C02094",
            compound_names: &many,
            pathway_id: "path:map00906",
            pathway_name: "Carotenoid biosynthesis",
            result: &result,
        };
        let path = write_summary_csv(dir.path(), &ctx).unwrap();
        let mut rdr = csv::Reader::from_path(path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["product_query", "compound_id", "compound_names", "pathway_id", "pathway_name"]
        );
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(row[2].split("; ").count(), 20);
    }
}
