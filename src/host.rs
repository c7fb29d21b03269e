use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::db;
use crate::error::Result;
use crate::kegg::listing::parse_link_pairs;
use crate::kegg::{fetch_record, normalize_pathway_id, CachedSource, KeggClient, RecordSource};
use crate::model::Category;
use crate::parser::aggregate::ExtractionResult;
use crate::parser::extract_record;
use crate::parser::fields::pathway_name;
use crate::report;
use crate::settings::Settings;

static EC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").unwrap());

const MAX_GENES_LISTED: usize = 50;
pub const HETEROLOGOUS_MODULE: &[&str] = &["crtE", "crtB", "crtI", "crtY"];

/// Native S. cerevisiae MVA route: (gene, role, engineering tag).
pub const MVA_GENES: &[(&str, &str, &str)] = &[
    ("ERG10", "Acetyl-CoA acetyltransferase", "non-essential"),
    ("ERG13", "HMG-CoA synthase", "non-essential"),
    ("HMG1", "HMG-CoA reductase", "rate-limiting"),
    ("HMG2", "HMG-CoA reductase isozyme", "rate-limiting"),
    ("ERG12", "Mevalonate kinase", "essential"),
    ("ERG8", "Phosphomevalonate kinase", "essential"),
    ("ERG19", "Mevalonate diphosphate decarboxylase", "essential"),
    ("IDI1", "IPP isomerase", "important"),
    ("ERG20", "FPP synthase", "branch-point"),
    ("BTS1", "GGPP synthase", "target-directing"),
];

/// Fully specified EC numbers mentioned by the pathway's enzyme entries,
/// sorted and unique. Partial codes like `1.14.14.-` are skipped.
pub fn ec_numbers(result: &ExtractionResult) -> Vec<String> {
    let mut ecs = BTreeSet::new();
    for entity in result.entities(Category::Enzyme) {
        let fields = [
            Some(entity.identifier.as_str()),
            Some(entity.display_name.as_str()),
            entity.cross_reference.as_deref(),
        ];
        for token in fields.into_iter().flatten().flat_map(str::split_whitespace) {
            let token = token.trim_matches(|c: char| c == ';' || c == ',');
            let token = token.strip_prefix("EC:").unwrap_or(token);
            if EC_RE.is_match(token) {
                ecs.insert(token.to_string());
            }
        }
    }
    ecs.into_iter().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcMapping {
    pub ec: String,
    pub genes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HostMapping {
    pub organism: String,
    pub pathway_id: String,
    pub pathway_name: String,
    pub pathway_genes: Vec<String>,
    /// Sorted by (gene count, ec).
    pub ecs: Vec<EcMapping>,
}

impl HostMapping {
    /// Build from raw `/link` listings: the pathway → host genes listing and
    /// one (ec, listing) per EC number.
    pub fn from_links(
        organism: &str,
        pathway_id: &str,
        pathway_name: &str,
        pathway_listing: &str,
        ec_listings: &[(String, String)],
    ) -> Self {
        let pathway_genes = unique_targets(pathway_listing);
        let mut ecs: Vec<EcMapping> = ec_listings
            .iter()
            .map(|(ec, listing)| EcMapping {
                ec: ec.clone(),
                genes: unique_targets(listing),
            })
            .collect();
        ecs.sort_by(|a, b| a.genes.len().cmp(&b.genes.len()).then_with(|| a.ec.cmp(&b.ec)));

        Self {
            organism: organism.to_string(),
            pathway_id: pathway_id.to_string(),
            pathway_name: pathway_name.to_string(),
            pathway_genes,
            ecs,
        }
    }

    pub fn present(&self) -> impl Iterator<Item = &EcMapping> {
        self.ecs.iter().filter(|m| !m.genes.is_empty())
    }

    pub fn missing(&self) -> impl Iterator<Item = &EcMapping> {
        self.ecs.iter().filter(|m| m.genes.is_empty())
    }

    /// No EC has a native host gene (or there are no ECs at all).
    pub fn fully_heterologous(&self) -> bool {
        self.present().next().is_none()
    }
}

fn unique_targets(listing: &str) -> Vec<String> {
    parse_link_pairs(listing)
        .into_iter()
        .map(|(_, target)| target)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Query KEGG for host genes linked to the pathway and to each EC number.
pub async fn map_host(
    client: &KeggClient,
    organism: &str,
    pathway_id: &str,
    pathway_name: &str,
    ecs: &[String],
) -> Result<HostMapping> {
    let pathway_listing = client.link(organism, pathway_id).await?;

    let pb = ProgressBar::new(ecs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut ec_listings = Vec::with_capacity(ecs.len());
    for ec in ecs {
        pb.set_message(format!("ec:{}", ec));
        let listing = client.link(organism, &format!("ec:{}", ec)).await?;
        ec_listings.push((ec.clone(), listing));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mapping = HostMapping::from_links(
        organism,
        pathway_id,
        pathway_name,
        &pathway_listing,
        &ec_listings,
    );
    if mapping.ecs.is_empty() {
        warn!("No ECs mapped. This pathway is likely fully heterologous in {}.", organism);
    }
    info!(
        "EC total={}, present_in_{}={}, missing_in_{}={}",
        mapping.ecs.len(),
        organism,
        mapping.present().count(),
        organism,
        mapping.missing().count()
    );
    Ok(mapping)
}

/// Fetch the pathway, map its ECs onto `settings.organism` and write the
/// host outputs. The pathway record goes through the SQLite cache only when
/// `use_cache` is set.
pub async fn run_host(
    settings: &Settings,
    pathway: &str,
    outdir: &Path,
) -> Result<(HostMapping, Vec<PathBuf>)> {
    let client = KeggClient::new(settings)?;
    let pathway_id = normalize_pathway_id(pathway);
    if settings.use_cache {
        let conn = db::connect(&settings.cache_path)?;
        let source = CachedSource::new(client, conn, settings.cache_max_age_days);
        map_pathway(&source, source.inner(), settings, &pathway_id, outdir).await
    } else {
        map_pathway(&client, &client, settings, &pathway_id, outdir).await
    }
}

async fn map_pathway<S: RecordSource>(
    source: &S,
    client: &KeggClient,
    settings: &Settings,
    pathway_id: &str,
    outdir: &Path,
) -> Result<(HostMapping, Vec<PathBuf>)> {
    let record = fetch_record(source, pathway_id).await?;
    let result = extract_record(&record, settings.split_mode);
    let ecs = ec_numbers(&result);
    info!("{}: {} EC numbers", record.entry_id, ecs.len());

    let name = pathway_name(&record.text);
    let mapping = map_host(client, &settings.organism, pathway_id, &name, &ecs).await?;
    report::ensure_outdir(outdir)?;
    let files = write_outputs(outdir, &mapping)?;
    Ok((mapping, files))
}

// ── Recommendations ──

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub module_type: &'static str,
    pub gene: &'static str,
    pub role: &'static str,
    pub confidence: &'static str,
}

pub fn recommendations(fully_heterologous: bool) -> Vec<Recommendation> {
    let mut rows = Vec::new();
    if fully_heterologous {
        rows.extend(HETEROLOGOUS_MODULE.iter().map(|gene| Recommendation {
            module_type: "heterologous",
            gene: *gene,
            role: "carotenoid biosynthesis core step",
            confidence: "high",
        }));
    }
    rows.extend(MVA_GENES.iter().map(|&(gene, _, _)| Recommendation {
        module_type: "native_enhancement",
        gene,
        role: "IPP/DMAPP/FPP/GGPP precursor supply (MVA pathway)",
        confidence: "medium",
    }));
    rows
}

#[derive(Debug, Clone, Serialize)]
pub struct MvaPriority {
    pub gene: &'static str,
    pub role: &'static str,
    pub engineering_tag: &'static str,
    pub recommended_action: &'static str,
}

pub fn mva_priorities() -> Vec<MvaPriority> {
    MVA_GENES
        .iter()
        .map(|&(gene, role, tag)| MvaPriority {
            gene,
            role,
            engineering_tag: tag,
            recommended_action: match tag {
                "rate-limiting" | "target-directing" => "overexpression",
                _ => "fine-tuning",
            },
        })
        .collect()
}

// ── Output ──

pub fn render_report(mapping: &HostMapping) -> String {
    let org = &mapping.organism;
    let missing: Vec<&EcMapping> = mapping.missing().collect();
    let mut md = String::new();

    let _ = writeln!(md, "# Host mapping for {} {}\n", mapping.pathway_id, mapping.pathway_name);
    let _ = writeln!(md, "- ECs in pathway: {}", mapping.ecs.len());
    let _ = writeln!(md, "- ECs with >=1 *{}* gene: {}", org, mapping.present().count());
    let _ = writeln!(
        md,
        "- ECs with 0 *{}* gene (likely heterologous needed): {}\n",
        org,
        missing.len()
    );

    let _ = writeln!(md, "## Likely heterologous-needed ECs ({}_gene_count = 0)\n", org);
    if missing.is_empty() {
        let _ = writeln!(md, "None.");
    } else {
        for m in &missing {
            let _ = writeln!(md, "- EC:{}", m.ec);
        }
    }

    let _ = writeln!(md, "\n## Engineering Recommendations\n");
    if mapping.fully_heterologous() {
        let _ = writeln!(md, "- **Pathway feasibility**: Fully heterologous in *{}*", org);
        let _ = writeln!(md, "- **Required heterologous module**: {}", HETEROLOGOUS_MODULE.join(" / "));
    } else {
        let _ = writeln!(md, "- **Pathway feasibility**: Partially native");
    }
    let _ = writeln!(md, "- **Native precursor enhancement (MVA pathway)**:");
    let genes: Vec<&str> = MVA_GENES.iter().map(|(g, _, _)| *g).collect();
    let _ = writeln!(md, "  {}", genes.join(", "));
    let _ = writeln!(md, "- **Risk notes**: NADPH demand, membrane burden, sterol competition");

    let _ = writeln!(md, "\n## Files generated\n");
    for file in output_files(org) {
        let _ = writeln!(md, "- `{}`", file);
    }
    md
}

fn output_files(org: &str) -> [String; 5] {
    [
        format!("{}_genes_in_pathway.csv", org),
        format!("ec_to_{}_genes.csv", org),
        "engineering_recommendations.csv".to_string(),
        "mva_engineering_priorities.csv".to_string(),
        "yeast_mapping_report.md".to_string(),
    ]
}

pub fn write_outputs(outdir: &Path, mapping: &HostMapping) -> Result<Vec<PathBuf>> {
    let org = &mapping.organism;
    let [genes_file, ec_file, rec_file, mva_file, report_file] = output_files(org);

    let genes_path = outdir.join(genes_file);
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(&genes_path)?;
    wtr.write_record([format!("{}_gene", org)])?;
    for gene in &mapping.pathway_genes {
        wtr.write_record([gene])?;
    }
    wtr.flush()?;

    let ec_path = outdir.join(ec_file);
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(&ec_path)?;
    wtr.write_record([
        "ec".to_string(),
        format!("{}_gene_count", org),
        format!("{}_genes", org),
    ])?;
    for m in &mapping.ecs {
        let listed = &m.genes[..m.genes.len().min(MAX_GENES_LISTED)];
        wtr.write_record([m.ec.clone(), m.genes.len().to_string(), listed.join(";")])?;
    }
    wtr.flush()?;

    let rec_path = outdir.join(rec_file);
    let mut wtr = csv::Writer::from_path(&rec_path)?;
    for row in recommendations(mapping.fully_heterologous()) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    let mva_path = outdir.join(mva_file);
    let mut wtr = csv::Writer::from_path(&mva_path)?;
    for row in mva_priorities() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    let report_path = outdir.join(report_file);
    std::fs::write(&report_path, render_report(mapping))?;

    Ok(vec![genes_path, ec_path, rec_path, mva_path, report_path])
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PathwayRecord;
    use crate::parser::extract_record;
    use crate::parser::sections::SplitMode;
    use wiremock::{
        matchers::{method, path, path_regex},
        Mock, MockServer, ResponseTemplate,
    };

    fn enzymes(text: &str) -> ExtractionResult {
        extract_record(&PathwayRecord::new("t", text), SplitMode::Strict)
    }

    #[test]
    fn ec_numbers_from_identifiers_and_xrefs() {
        let result = enzymes(
            "ENZYME      2.5.1.32  15-cis-phytoene synthase\n\
             \x20           1.3.5.5  1.3.5.6\n\
             \x20           K00514  ZDS; EC:1.3.5.6; EC:1.14.14.-\n\
             \x20           2.5.1.32  duplicate",
        );
        assert_eq!(ec_numbers(&result), vec!["1.3.5.5", "1.3.5.6", "2.5.1.32"]);
    }

    #[test]
    fn ec_numbers_fixture() {
        let text = std::fs::read_to_string("tests/fixtures/ec00906.txt").unwrap();
        let ecs = ec_numbers(&enzymes(&text));
        assert_eq!(ecs.len(), 8);
        assert_eq!(ecs.first().map(String::as_str), Some("1.14.15.21"));
    }

    #[test]
    fn ec_numbers_ignore_other_categories() {
        let result = enzymes("GENE        AT5G17230  PSY [EC:2.5.1.32]");
        assert!(ec_numbers(&result).is_empty());
    }

    fn mapping() -> HostMapping {
        HostMapping::from_links(
            "sce",
            "path:map00906",
            "Carotenoid biosynthesis",
            "path:map00906\tsce:YPL117C\npath:map00906\tsce:YPL117C\n",
            &[
                ("5.5.1.19".to_string(), String::new()),
                ("2.5.1.29".to_string(), "ec:2.5.1.29\tsce:YPL069C\n".to_string()),
                ("2.5.1.32".to_string(), String::new()),
            ],
        )
    }

    #[test]
    fn mapping_sorts_by_count_then_ec() {
        let m = mapping();
        let order: Vec<&str> = m.ecs.iter().map(|e| e.ec.as_str()).collect();
        assert_eq!(order, vec!["2.5.1.32", "5.5.1.19", "2.5.1.29"]);
        assert_eq!(m.pathway_genes, vec!["sce:YPL117C"]);
        assert_eq!(m.missing().count(), 2);
        assert!(!m.fully_heterologous());
    }

    #[test]
    fn no_ecs_is_fully_heterologous() {
        let m = HostMapping::from_links("sce", "path:map00906", "", "", &[]);
        assert!(m.fully_heterologous());
        assert_eq!(recommendations(true).len(), 14);
        assert_eq!(recommendations(false).len(), 10);
        assert_eq!(recommendations(true)[0].gene, "crtE");
    }

    #[test]
    fn mva_actions() {
        let rows = mva_priorities();
        assert_eq!(rows.len(), 10);
        let hmg1 = rows.iter().find(|r| r.gene == "HMG1").unwrap();
        assert_eq!(hmg1.recommended_action, "overexpression");
        let bts1 = rows.iter().find(|r| r.gene == "BTS1").unwrap();
        assert_eq!(bts1.recommended_action, "overexpression");
        let erg12 = rows.iter().find(|r| r.gene == "ERG12").unwrap();
        assert_eq!(erg12.recommended_action, "fine-tuning");
    }

    #[test]
    fn report_lists_missing_ecs() {
        let md = render_report(&mapping());
        assert!(md.contains("- ECs in pathway: 3"));
        assert!(md.contains("- ECs with >=1 *sce* gene: 1"));
        assert!(md.contains("- EC:2.5.1.32\n- EC:5.5.1.19"));
        assert!(md.contains("Partially native"));
    }

    async fn kegg_server(expected_gets: u64) -> MockServer {
        let server = MockServer::start().await;
        let text = std::fs::read_to_string("tests/fixtures/ec00906.txt").unwrap();
        Mock::given(method("GET"))
            .and(path("/get/path:ec00906"))
            .respond_with(ResponseTemplate::new(200).set_body_string(text))
            .expect(expected_gets)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/link/sce/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    fn settings(server: &MockServer, cache_path: &Path, use_cache: bool) -> Settings {
        let mut s = Settings::defaults().unwrap();
        s.base_url = server.uri();
        s.backoff_ms = 1;
        s.cache_path = cache_path.display().to_string();
        s.use_cache = use_cache;
        s
    }

    #[tokio::test]
    async fn uncached_run_leaves_no_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache/kegg.sqlite");
        let server = kegg_server(1).await;

        let out = dir.path().join("out");
        let (mapping, files) = run_host(&settings(&server, &cache, false), "ec00906", &out)
            .await
            .unwrap();
        assert_eq!(mapping.pathway_id, "path:ec00906");
        assert_eq!(mapping.pathway_name, "Carotenoid biosynthesis");
        assert_eq!(mapping.ecs.len(), 8);
        assert!(mapping.fully_heterologous());
        assert_eq!(files.len(), 5);
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn cached_run_fetches_pathway_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("kegg.sqlite");
        let server = kegg_server(1).await;
        let s = settings(&server, &cache, true);

        run_host(&s, "path:ec00906", dir.path()).await.unwrap();
        run_host(&s, "path:ec00906", dir.path()).await.unwrap();
        assert!(cache.exists());
    }

    #[test]
    fn outputs_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_outputs(dir.path(), &mapping()).unwrap();
        assert_eq!(files.len(), 5);
        let ec_csv = std::fs::read_to_string(dir.path().join("ec_to_sce_genes.csv")).unwrap();
        let mut lines = ec_csv.lines();
        assert_eq!(lines.next(), Some("ec,sce_gene_count,sce_genes"));
        assert_eq!(lines.next(), Some("2.5.1.32,0,"));
        let genes = std::fs::read_to_string(dir.path().join("sce_genes_in_pathway.csv")).unwrap();
        assert_eq!(genes, "sce_gene\nsce:YPL117C\n");
    }
}
