use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::classify;
use crate::error::{ExpertError, Result};
use crate::kegg::listing::{choose_best_compound_id, parse_find_hits};
use crate::kegg::{fetch_record, normalize_compound_id, normalize_pathway_id, RecordSource};
use crate::parser::aggregate::ExtractionResult;
use crate::parser::fields::{compound_names, pathway_name};
use crate::parser::extract_record;
use crate::parser::sections::SplitMode;
use crate::report::{self, ReportContext};

const DEFAULT_PATHWAY: &str = "path:map00906";

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub product: String,
    pub compound: Option<String>,
    pub pathway: Option<String>,
    /// Fail with `UnknownProduct` instead of warning.
    pub require_class: bool,
}

impl RunRequest {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            compound: None,
            pathway: None,
            require_class: false,
        }
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub compound_id: String,
    pub compound_names: Vec<String>,
    pub pathway_id: String,
    pub pathway_name: String,
    pub result: ExtractionResult,
    pub files: Vec<PathBuf>,
}

/// Compound id for the product: explicit, then the known-compound table,
/// then a KEGG `find` search.
pub async fn resolve_compound<S: RecordSource>(
    source: &S,
    product: &str,
    explicit: Option<&str>,
) -> Result<String> {
    if let Some(id) = explicit {
        return Ok(normalize_compound_id(id));
    }
    if let Some(id) = classify::known_compound(product) {
        return Ok(id.to_string());
    }
    let listing = source.find("compound", product).await?;
    let hits = parse_find_hits(&listing);
    let best = choose_best_compound_id(product, &hits)?;
    Ok(normalize_compound_id(&best))
}

pub async fn run<S: RecordSource>(
    source: &S,
    request: &RunRequest,
    outdir: &Path,
    mode: SplitMode,
) -> Result<RunOutcome> {
    let class = classify::classify(&request.product);
    match class {
        Some(c) => info!("Product class: {} (default pathway {})", c.name, c.pathway),
        None if request.require_class => {
            return Err(ExpertError::UnknownProduct(request.product.clone()))
        }
        None => warn!("No class rule matched '{}'", request.product),
    }

    let compound_id =
        resolve_compound(source, &request.product, request.compound.as_deref()).await?;
    let pathway_id = match (&request.pathway, class) {
        (Some(p), _) => normalize_pathway_id(p),
        (None, Some(c)) => c.pathway.to_string(),
        (None, None) => DEFAULT_PATHWAY.to_string(),
    };
    info!("Compound {} / pathway {}", compound_id, pathway_id);

    let compound = fetch_record(source, &compound_id).await?;
    let pathway = fetch_record(source, &pathway_id).await?;

    let result = extract_record(&pathway, mode);
    let names = compound_names(&compound.text);
    let pw_name = pathway_name(&pathway.text);
    for (category, count) in result.counts() {
        info!("{}: {}", category.report_label(), count);
    }
    if result.unparsed > 0 {
        warn!("{} lines could not be parsed", result.unparsed);
    }

    report::ensure_outdir(outdir)?;
    let mut files = vec![
        report::write_raw(outdir, "compound_raw.txt", &compound.text)?,
        report::write_raw(outdir, "pathway_raw.txt", &pathway.text)?,
    ];
    files.extend(report::write_entity_csvs(outdir, &result)?);

    let ctx = ReportContext {
        product: &request.product,
        compound_id: &compound_id,
        compound_names: &names,
        pathway_id: &pathway_id,
        pathway_name: &pw_name,
        result: &result,
    };
    files.push(report::write_summary_csv(outdir, &ctx)?);
    files.push(report::write_markdown(outdir, &ctx)?);

    Ok(RunOutcome {
        compound_id,
        compound_names: names,
        pathway_id,
        pathway_name: pw_name,
        result,
        files,
    })
}

// ── Tests ──
