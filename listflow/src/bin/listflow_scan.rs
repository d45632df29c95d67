use anyhow::{Context, Result};
use clap::Parser;
use listflow::prelude::*;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "listflow-scan",
    about = "Classify a marketplace page, extract its listings and print a JSON report"
)]
struct ScanCli {
    /// Locator the saved page was captured from
    #[arg(long)]
    url: String,

    /// Saved HTML file; reads stdin when omitted or `-`
    #[arg(long)]
    html: Option<PathBuf>,

    /// Target-market price to evaluate profitability against
    #[arg(long)]
    target_price: Option<f64>,

    /// JSON pipeline configuration
    #[arg(long, env = "LISTFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

/// A saved page served as a static document.
struct SavedPage {
    locator: String,
    html: String,
}

impl DocumentHost for SavedPage {
    fn locator(&self) -> String {
        self.locator.clone()
    }

    fn snapshot(&self) -> String {
        self.html.clone()
    }
}

#[derive(Serialize)]
struct Evaluation {
    title: String,
    url: String,
    result: ProfitabilityResult,
}

#[derive(Serialize)]
struct ScanOutput {
    locator: String,
    page_type: PageType,
    report: PageReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    evaluations: Vec<Evaluation>,
}

fn read_html(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut html = String::new();
            std::io::stdin()
                .read_to_string(&mut html)
                .context("failed to read HTML from stdin")?;
            Ok(html)
        }
    }
}

fn evaluate_all(
    pipeline: &ListingPipeline,
    report: &PageReport,
    target_price: f64,
) -> Vec<Evaluation> {
    let records: Vec<&ListingRecord> = match report {
        PageReport::Search(batch) => batch.fragments.iter().map(|f| &f.record).collect(),
        PageReport::Listing(outcome) => vec![&outcome.record],
        PageReport::TargetItem(_) | PageReport::Idle { .. } => Vec::new(),
    };
    records
        .into_iter()
        .map(|record| Evaluation {
            title: record.title.clone(),
            url: record.url.clone(),
            result: pipeline.evaluate(record, Some(target_price)),
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ScanCli::parse();
    init_tracing(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    anyhow::ensure!(!cli.url.trim().is_empty(), "url must not be empty");

    let page = SavedPage {
        locator: cli.url.clone(),
        html: read_html(cli.html.as_ref())?,
    };
    let pipeline = ListingPipeline::builder(config)
        .presenter(Arc::new(LoggingPresenter::debug()))
        .build();

    let report = pipeline.initialize(&page).await;
    let evaluations = cli
        .target_price
        .map(|price| evaluate_all(&pipeline, &report, price))
        .unwrap_or_default();

    let output = ScanOutput {
        page_type: classify(&cli.url),
        locator: cli.url,
        report,
        evaluations,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to serialize report")?
    );
    Ok(())
}
