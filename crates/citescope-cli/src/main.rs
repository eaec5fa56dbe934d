use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use citescope_core::{CitationDocument, CitedReport, CitingReport, QueryInfo};
use citescope_sources::{FetchConfig, Harvester};

const SUMMARY_LIMIT: usize = 20;
const SUMMARY_TITLE_CHARS: usize = 100;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "citescope",
    about = "Citation analysis around a seed set of papers",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch metadata, references and citing works for a list of DOIs.
    Fetch {
        /// Input file with one DOI per line.
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Output JSON document.
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Maximum citing works to fetch per paper.
        #[arg(long)]
        max_citing: Option<u32>,

        /// TOML file with endpoints, rate limits and API keys.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute the frequently-cited and frequently-citing paper lists.
    Analyze {
        /// Citation document produced by `citescope fetch`.
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Minimum seed papers that must cite a reference.
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        kcited: u32,

        /// Minimum seed papers a citing paper must cite.
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        kciting: u32,

        #[arg(long, default_value = "k_cited.json")]
        output_cited: PathBuf,

        #[arg(long, default_value = "k_citing.json")]
        output_citing: PathBuf,
    },

    /// Render the citation graph as an interactive HTML page.
    Graph {
        /// Citation document produced by `citescope fetch`.
        #[arg(long, short = 'i')]
        input: PathBuf,

        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        kcited: u32,

        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        kciting: u32,

        #[arg(long, short = 'o', default_value = "graph.html")]
        output: PathBuf,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Fetch {
            input,
            output,
            max_citing,
            config,
        } => fetch(&input, &output, max_citing, config.as_deref()).await,
        Commands::Analyze {
            input,
            kcited,
            kciting,
            output_cited,
            output_citing,
        } => analyze(&input, kcited, kciting, &output_cited, &output_citing),
        Commands::Graph {
            input,
            kcited,
            kciting,
            output,
        } => graph(&input, kcited, kciting, &output),
    }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn fetch(
    input: &Path,
    output: &Path,
    max_citing: Option<u32>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = FetchConfig::load(config_path)?;
    if let Some(max) = max_citing {
        config.max_citing = max;
    }

    let text = fs::read_to_string(input)
        .with_context(|| format!("reading DOI list {}", input.display()))?;
    let dois: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    println!(
        "Processing {} DOIs using OpenAlex + Semantic Scholar...",
        dois.len()
    );

    let harvester = Harvester::new(&config);
    let mut papers = Vec::with_capacity(dois.len());
    for (i, doi) in dois.iter().enumerate() {
        println!("[{}/{}] Processing: {doi}", i + 1, dois.len());
        papers.push(harvester.harvest(doi).await);
    }

    let document = CitationDocument {
        query_info: Some(QueryInfo {
            input_file: Some(input.display().to_string()),
            num_dois: Some(dois.len()),
            max_citing_per_paper: Some(harvester.max_citing()),
            sources: vec!["openalex".to_string(), "semantic_scholar".to_string()],
        }),
        papers,
    };

    write_json(output, &serde_json::to_value(&document)?)?;
    println!("Results saved to: {}", output.display());

    let successful = document.papers.iter().filter(|p| p.error.is_none()).count();
    let total_refs: usize = document.papers.iter().map(|p| p.references.len()).sum();
    let total_citing: usize = document.papers.iter().map(|p| p.cited_by.len()).sum();
    println!("Successfully processed: {successful}/{} papers", dois.len());
    println!("Total references found: {total_refs}");
    println!("Total citing works found: {total_citing}");
    Ok(())
}

fn analyze(
    input: &Path,
    kcited: u32,
    kciting: u32,
    output_cited: &Path,
    output_citing: &Path,
) -> Result<()> {
    let document = load_document(input)?;
    println!("Seed set contains {} papers", document.papers.len());
    println!("Computing R_k (k_cited >= {kcited}) and Q_k' (k_citing >= {kciting})...");

    let (cited, citing) = citescope_core::analyze(&document, kcited, kciting);

    write_json(output_cited, &serde_json::to_value(&cited)?)?;
    println!("Saved cited papers to: {}", output_cited.display());
    write_json(output_citing, &serde_json::to_value(&citing)?)?;
    println!("Saved citing papers to: {}", output_citing.display());

    print_summary(&cited, &citing);
    Ok(())
}

fn graph(input: &Path, kcited: u32, kciting: u32, output: &Path) -> Result<()> {
    let document = load_document(input)?;
    println!("Seed set contains {} papers", document.papers.len());
    println!("Analyzing with k_cited={kcited}, k_citing={kciting}...");

    let graph = citescope_core::build_graph(&document, kcited, kciting);
    println!("Graph nodes:");
    println!("  - Seed papers: {}", graph.seed_papers.len());
    println!("  - Cited papers: {}", graph.cited_papers.len());
    println!("  - Citing papers: {}", graph.citing_papers.len());
    println!("  - Total edges: {}", graph.edges.len());

    let html = citescope_viz::render(&graph, kcited, kciting);
    fs::write(output, html).with_context(|| format!("writing {}", output.display()))?;
    println!("Visualization saved to: {}", output.display());
    println!("Open this file in a web browser to view the interactive graph.");
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn load_document(input: &Path) -> Result<CitationDocument> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("reading citation document {}", input.display()))?;
    CitationDocument::from_json_str(&text)
        .with_context(|| format!("parsing citation document {}", input.display()))
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}

fn print_summary(cited: &CitedReport, citing: &CitingReport) {
    let rule = "=".repeat(70);
    println!();
    println!("{rule}");
    println!("ANALYSIS SUMMARY");
    println!("{rule}");

    println!(
        "\nPapers cited by at least {} seed papers: {}",
        cited.k_cited, cited.count
    );
    print_entries(
        cited
            .papers
            .iter()
            .map(|p| (p.c_in, "c_in", p.title.as_str(), p.year, p.doi.as_str(), p.arxiv_id.as_str())),
    );

    println!(
        "\nPapers citing at least {} seed papers: {}",
        citing.k_citing, citing.count
    );
    print_entries(
        citing
            .papers
            .iter()
            .map(|p| (p.c_out, "c_out", p.title.as_str(), p.year, p.doi.as_str(), p.arxiv_id.as_str())),
    );

    println!();
    println!("{rule}");
}

fn print_entries<'a, I>(entries: I)
where
    I: ExactSizeIterator<Item = (usize, &'a str, &'a str, Option<i32>, &'a str, &'a str)>,
{
    if entries.len() == 0 {
        return;
    }
    println!("{}", "-".repeat(70));

    let total = entries.len();
    for (i, (count, count_name, title, year, doi, arxiv_id)) in
        entries.take(SUMMARY_LIMIT).enumerate()
    {
        let title = if title.chars().count() > SUMMARY_TITLE_CHARS {
            let head: String = title.chars().take(SUMMARY_TITLE_CHARS).collect();
            format!("{head}...")
        } else {
            title.to_string()
        };
        println!("  {:2}. [{count_name}={count}] {title}", i + 1);

        let year = year.map(|y| y.to_string()).unwrap_or_default();
        let id = if !doi.is_empty() {
            format!("DOI: {doi}")
        } else if !arxiv_id.is_empty() {
            format!("arXiv: {arxiv_id}")
        } else {
            "No ID".to_string()
        };
        println!("      Year: {year} | {id}");
    }
    if total > SUMMARY_LIMIT {
        println!("  ... and {} more", total - SUMMARY_LIMIT);
    }
}
