use anyhow::{Context, Result, anyhow};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use sift::catalog::{Record, read_lines, record_matches};
use sift::config::{CompiledFilter, FiltersConfig};
use sift::{FilterCache, ProfileId};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input catalog, one JSON object per line ("-" for stdin)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Filter configuration file (YAML, TOML or JSON)
    #[arg(short, long, conflicts_with = "query")]
    pub filters: Option<PathBuf>,

    /// Name of the filter to apply from --filters (optional when the file
    /// defines a single filter)
    #[arg(long)]
    pub filter: Option<String>,

    /// Ad-hoc query, e.g. 'has Konami and not has Capcom'
    #[arg(short, long, requires = "field")]
    pub query: Option<String>,

    /// Record field the ad-hoc query reads
    #[arg(long)]
    pub field: Option<String>,

    /// Profile of the ad-hoc query
    #[arg(short, long, default_value = "substring")]
    pub profile: ProfileId,

    /// Output file for matching lines (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Build the filter selected on the command line.
pub fn resolve_filter(cli: &Cli, cache: &FilterCache) -> Result<CompiledFilter> {
    if let Some(path) = &cli.filters {
        let config = FiltersConfig::load(path)?;
        let name = match (&cli.filter, config.filters.keys().next()) {
            (Some(name), _) => name.as_str(),
            (None, Some(only)) if config.filters.len() == 1 => only.as_str(),
            (None, _) => anyhow::bail!(
                "CLI: --filter is required when {:?} defines {} filters",
                path,
                config.filters.len()
            ),
        };
        return config.compile_named(name, cache);
    }

    match (&cli.query, &cli.field) {
        (Some(query), Some(field)) => CompiledFilter::ad_hoc(field, cli.profile, query, cache),
        _ => Err(anyhow!(
            "CLI: Provide either --filters with --filter, or --query with --field"
        )),
    }
}

pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("CLI: Failed to open {:?}", path))?;
    Ok(Box::new(BufReader::new(file)))
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
        Some(path) if path == Path::new("-") => Ok(Box::new(BufWriter::new(std::io::stdout()))),
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("CLI: Failed to create {:?}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

/// Evaluate `filter` over every line in parallel, keeping input order.
/// Returns the matching raw lines.
pub fn select_matching(filter: &CompiledFilter, lines: Vec<(usize, String)>) -> Result<Vec<String>> {
    let verdicts: Vec<Option<String>> = lines
        .into_par_iter()
        .map(|(line, raw)| {
            let record = Record::parse(line, raw)?;
            let matched = record_matches(filter, &record).with_context(|| {
                format!(
                    "Filter: Evaluating '{}' failed on line {}",
                    filter.name, record.line
                )
            })?;
            Ok(matched.then_some(record.raw))
        })
        .collect::<Result<_>>()?;

    Ok(verdicts.into_iter().flatten().collect())
}

pub fn process_catalog(cli: &Cli) -> Result<usize> {
    let cache = FilterCache::new();
    let filter = resolve_filter(cli, &cache)?;
    tracing::info!(
        "Filter '{}': {} clause(s), {:?} mode",
        filter.name,
        filter.clauses.len(),
        filter.mode
    );
    for clause in &filter.clauses {
        tracing::info!(
            "  {} [{}]: {}",
            clause.field,
            clause.filter.profile(),
            clause.filter.root()
        );
    }

    let lines = read_lines(open_input(&cli.input)?)?;
    let total = lines.len();
    tracing::info!("Read {} records from {:?}", total, cli.input);

    let matches = select_matching(&filter, lines)?;

    let mut out = open_output(cli.output.as_deref())?;
    for line in &matches {
        writeln!(out, "{}", line).context("CLI: Failed to write output")?;
    }
    out.flush().context("CLI: Failed to flush output")?;

    tracing::info!("Matched {} of {} records", matches.len(), total);
    Ok(matches.len())
}
