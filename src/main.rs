mod classify;
mod db;
mod engineering_map;
mod error;
mod host;
mod kegg;
mod model;
mod parser;
mod pipeline;
mod report;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use kegg::{CachedSource, FileSource, KeggClient, RecordSource};
use model::{Category, PathwayRecord};
use parser::sections::SplitMode;
use pipeline::RunRequest;
use settings::Settings;

#[derive(Parser)]
#[command(name = "kegg_expert", about = "KEGG pathway extraction for microbial product engineering")]
struct Cli {
    /// Output directory (overrides config)
    #[arg(long, global = true)]
    outdir: Option<PathBuf>,
    /// Unknown-header handling: lenient or strict (overrides config)
    #[arg(long, global = true)]
    split_mode: Option<SplitMode>,
    /// Bypass the SQLite record cache
    #[arg(long, global = true)]
    no_cache: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify, fetch, extract and write CSVs plus report.md
    Run {
        /// Target product, e.g. "β-carotene"
        #[arg(default_value = "β-carotene")]
        product: String,
        /// KEGG compound id (skips lookup)
        #[arg(long)]
        compound: Option<String>,
        /// KEGG pathway id (default: from product class)
        #[arg(long)]
        pathway: Option<String>,
        /// Fail if the product matches no class
        #[arg(long)]
        require_class: bool,
        /// Read records from <dir>/<id>.txt instead of KEGG
        #[arg(long)]
        offline: Option<PathBuf>,
    },
    /// Extract entities from a local flat-file record
    Extract {
        file: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the product class and known compound id
    Classify { product: String },
    /// Map pathway ECs to host organism genes
    Host {
        #[arg(long, default_value = "path:map00906")]
        pathway: String,
        /// KEGG organism code (overrides config)
        #[arg(long)]
        organism: Option<String>,
    },
    /// Write the engineering route as Graphviz DOT
    Map {
        #[arg(default_value = "β-carotene")]
        product: String,
    },
    /// Record cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache statistics
    Stats,
    /// Delete records older than cache_max_age_days
    Purge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(dir) = &cli.outdir {
        settings.outdir = dir.display().to_string();
    }
    if let Some(mode) = cli.split_mode {
        settings.split_mode = mode;
    }
    if cli.no_cache {
        settings.use_cache = false;
    }
    let outdir = PathBuf::from(&settings.outdir);

    let result = match cli.command {
        Commands::Run {
            product,
            compound,
            pathway,
            require_class,
            offline,
        } => {
            let request = RunRequest {
                product,
                compound,
                pathway,
                require_class,
            };
            match offline {
                Some(dir) => run_with(&FileSource::new(dir), &request, &outdir, &settings).await,
                None if settings.use_cache => {
                    let conn = db::connect(&settings.cache_path)?;
                    let source = CachedSource::new(
                        KeggClient::new(&settings)?,
                        conn,
                        settings.cache_max_age_days,
                    );
                    run_with(&source, &request, &outdir, &settings).await
                }
                None => run_with(&KeggClient::new(&settings)?, &request, &outdir, &settings).await,
            }
        }
        Commands::Extract { file, json } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let record = PathwayRecord::new(file.display().to_string(), text);
            let result = parser::extract_record(&record, settings.split_mode);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_entities(&result);
            }
            Ok(())
        }
        Commands::Classify { product } => {
            match classify::classify(&product) {
                Some(class) => {
                    println!("Class:    {}", class.name);
                    println!("Pathway:  {}", class.pathway);
                    println!("Notes:    {}", class.notes);
                }
                None => println!("Class:    (unrecognized)"),
            }
            match classify::known_compound(&product) {
                Some(id) => println!("Compound: {}", id),
                None => println!("Compound: (lookup via KEGG find)"),
            }
            Ok(())
        }
        Commands::Host { pathway, organism } => {
            if let Some(org) = organism {
                settings.organism = org;
            }
            let (mapping, files) = host::run_host(&settings, &pathway, &outdir)
                .await
                .with_context(|| format!("Host mapping failed for {}", pathway))?;
            println!(
                "{} ECs ({} present in {}, {} missing). Wrote {} files to {}",
                mapping.ecs.len(),
                mapping.present().count(),
                mapping.organism,
                mapping.missing().count(),
                files.len(),
                outdir.display()
            );
            Ok(())
        }
        Commands::Map { product } => {
            report::ensure_outdir(&outdir)?;
            let path = engineering_map::write_map(&outdir, &product)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Cache { action } => {
            let conn = db::connect(&settings.cache_path)?;
            let now = Utc::now();
            match action {
                CacheAction::Stats => {
                    let s = db::get_stats(&conn, settings.cache_max_age_days, now)?;
                    println!("Records: {}", s.total);
                    println!("Stale:   {}", s.stale);
                    println!("Oldest:  {}", s.oldest.as_deref().unwrap_or("-"));
                    println!("Newest:  {}", s.newest.as_deref().unwrap_or("-"));
                }
                CacheAction::Purge => {
                    let removed = db::purge_stale(&conn, settings.cache_max_age_days, now)?;
                    println!("Removed {} stale records.", removed);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_with<S: RecordSource>(
    source: &S,
    request: &RunRequest,
    outdir: &Path,
    settings: &Settings,
) -> anyhow::Result<()> {
    let outcome = pipeline::run(source, request, outdir, settings.split_mode)
        .await
        .with_context(|| format!("Run failed for '{}'", request.product))?;

    println!(
        "{} / {} {}",
        outcome.compound_id, outcome.pathway_id, outcome.pathway_name
    );
    if !outcome.compound_names.is_empty() {
        println!("  Names: {}", outcome.compound_names.join("; "));
    }
    for (category, count) in outcome.result.counts() {
        println!("  {:<16} {:>4}", category.report_label(), count);
    }
    if outcome.result.unparsed > 0 {
        println!("  {:<16} {:>4}", "Unparsed lines", outcome.result.unparsed);
    }
    println!(
        "{} entities. Wrote {} files to {}",
        outcome.result.total(),
        outcome.files.len(),
        outdir.display()
    );
    Ok(())
}

fn print_entities(result: &parser::aggregate::ExtractionResult) {
    for category in Category::ALL {
        let entities = result.entities(category);
        println!("--- {} ({}) ---", category.header(), entities.len());
        for e in entities {
            println!(
                "{:<14} | {:<48} | {}",
                e.identifier,
                truncate(&e.display_name, 48),
                e.cross_reference.as_deref().unwrap_or("")
            );
        }
    }
    if result.unparsed > 0 {
        println!("\n{} unparsed lines", result.unparsed);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
