// src/main.rs
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use company_match_lib::matching::{BatchMatcher, CancellationFlag, CompanyNameMatcher};
use company_match_lib::models::RawName;
use company_match_lib::registry::{CandidateProvider, InMemoryRegistry, RegistrySearchClient};
use company_match_lib::utils::config::MatcherConfig;
use company_match_lib::utils::env::load_env;
use company_match_lib::utils::progress_bars::progress_callback::{
    create_bar_callback, create_simple_callback,
};
use company_match_lib::utils::progress_bars::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scoring policy JSON file (overrides SCORING_POLICY_PATH)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Match every name in a CSV column against a registry
    Match {
        /// CSV file holding the names to resolve
        #[arg(long)]
        input: PathBuf,

        /// Column containing the names
        #[arg(long, default_value = "CustomerName")]
        column: String,

        /// Reference CSV with company_name and company_number columns
        #[arg(long, conflicts_with = "registry_url")]
        reference: Option<PathBuf>,

        /// Registry search service base URL (overrides REGISTRY_URL)
        #[arg(long)]
        registry_url: Option<String>,

        #[arg(long)]
        threshold: Option<f64>,

        /// Candidates requested per query
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        workers: Option<usize>,

        /// Attach the registry record to each high-confidence match
        #[arg(long, conflicts_with = "reference")]
        enrich: bool,

        /// JSON lines output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score and decide a single pair of names
    Compare {
        name_a: String,
        name_b: String,

        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Fetch one company record from the registry by number
    Lookup {
        company_number: String,

        #[arg(long)]
        registry_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    let mut config = MatcherConfig::from_env();
    if let Some(policy) = cli.policy {
        config.scoring_policy_path = Some(policy);
    }

    match cli.command {
        Command::Match {
            input,
            column,
            reference,
            registry_url,
            threshold,
            limit,
            workers,
            enrich,
            output,
        } => {
            if let Some(url) = registry_url {
                config.registry_url = url;
            }
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            if let Some(limit) = limit {
                config.candidate_limit = limit;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            run_match(
                &config,
                &input,
                &column,
                reference.as_deref(),
                enrich,
                output.as_deref(),
            )
            .await
        }
        Command::Compare {
            name_a,
            name_b,
            threshold,
        } => {
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            let matcher = CompanyNameMatcher::from_config(&config)?;
            let verdict = matcher.compare(&name_a, &name_b, config.threshold)?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(())
        }
        Command::Lookup {
            company_number,
            registry_url,
        } => {
            if let Some(url) = registry_url {
                config.registry_url = url;
            }
            config.validate()?;
            let client = RegistrySearchClient::from_config(&config)?;
            match client.fetch_company(&company_number).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => warn!("Company {} not found in registry", company_number),
            }
            Ok(())
        }
    }
}

async fn run_match(
    config: &MatcherConfig,
    input: &Path,
    column: &str,
    reference: Option<&Path>,
    enrich: bool,
    output: Option<&Path>,
) -> Result<()> {
    let batch = BatchMatcher::from_config(config)?;
    let queries = read_query_names(input, column)?;
    info!("Loaded {} names from {}", queries.len(), input.display());

    let provider: Arc<dyn CandidateProvider> = match reference {
        Some(path) => Arc::new(InMemoryRegistry::from_csv(
            path,
            batch.matcher().ensemble().normalizer(),
        )?),
        None => {
            info!("Using registry search at {}", config.registry_url);
            Arc::new(RegistrySearchClient::from_config(config)?)
        }
    };

    let cancel = CancellationFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight queries");
            signal_flag.cancel();
        }
    });

    let progress_config = ProgressConfig::from_env();
    let bar = progress_config.create_progress_bar(queries.len() as u64);
    let callback = match &bar {
        Some(bar) => create_bar_callback(bar.clone()),
        None => create_simple_callback("match"),
    };

    let report = batch
        .run(queries, provider.clone(), config.threshold, &cancel, Some(callback))
        .await?;
    if let Some(bar) = bar {
        bar.finish_with_message("Matching complete");
    }

    let records = if enrich {
        info!("🔎 Enriching high-confidence matches from {}", config.registry_url);
        RegistrySearchClient::from_config(config)?
            .enrich_matches(&report.results, batch.effective_workers(provider.as_ref()))
            .await
    } else {
        Vec::new()
    };

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for (i, result) in report.results.iter().enumerate() {
        let mut line = serde_json::to_value(result).context("Failed to serialize match result")?;
        if let Some(record) = records.get(i).and_then(Option::as_ref) {
            line["company"] = serde_json::to_value(record).context("Failed to serialize company record")?;
        }
        serde_json::to_writer(&mut writer, &line).context("Failed to serialize match result")?;
        writeln!(writer)?;
    }
    writer.flush().context("Failed to flush match results")?;

    info!(
        "Run {}: {}/{} matched, {} without acceptable candidate, {} failed{}",
        report.run_id,
        report.stats.matched,
        report.stats.processed,
        report.stats.no_acceptable_candidate,
        report.stats.candidate_failures + report.stats.scoring_failures,
        if report.stats.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}

/// Names from one CSV column; blank cells stay as missing names.
fn read_query_names(path: &Path, column: &str) -> Result<Vec<RawName>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open input file {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    let index = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| anyhow!("Column '{}' not found in {}", column, path.display()))?;

    let mut names = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
        let name = record
            .get(index)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        names.push(RawName(name));
    }
    Ok(names)
}
