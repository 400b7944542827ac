use analyzer::{AnalysisReport, Analyzer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{AnalysisConfig, MissingMetricPolicy, SensitivityAggregate, load_analysis_config};
use core_types::Pass;
use pareto::{ParetoResult, ParetoStatus};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Ranks and explains the passes of a genetic optimizer run.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score, rank and explain a set of optimizer passes.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// JSON file holding an array of pass records.
    #[arg(long)]
    passes: PathBuf,

    /// Analysis configuration (TOML). Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ranked passes to print.
    #[arg(long)]
    top: Option<usize>,

    /// Overrides the configured treatment of passes missing a weighted metric.
    #[arg(long, value_enum)]
    missing_metric_policy: Option<MissingMetricPolicy>,

    /// Overrides the configured sensitivity aggregate.
    #[arg(long, value_enum)]
    aggregate: Option<SensitivityAggregate>,

    /// Writes the full analysis report as JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args)?,
    }
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_analysis_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => AnalysisConfig::default(),
    };
    if let Some(policy) = args.missing_metric_policy {
        config.missing_metric_policy = policy;
    }
    if let Some(aggregate) = args.aggregate {
        config.sensitivity.aggregate = aggregate;
    }
    let top_n = args.top.unwrap_or(config.ranking.top_n);

    let passes = load_passes(&args.passes)?;
    tracing::info!(passes = passes.len(), "Loaded pass records from {:?}", args.passes);

    let analyzer = Analyzer::new(config);
    let report = analyzer.run(passes).context("Analysis failed")?;

    print_report(&report, analyzer.config(), top_n);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("Failed to write report to {:?}", path))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn load_passes(path: &Path) -> Result<Vec<Pass>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read passes from {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse passes in {:?}", path))
}

// ==============================================================================
// Console Output
// ==============================================================================

fn print_report(report: &AnalysisReport, config: &AnalysisConfig, top_n: usize) {
    let s = &report.summary;
    println!(
        "Analyzed {} of {} passes ({} filtered out), {} parameters, {} profitable, {} on the Pareto front. Generated {}.",
        s.analyzed_passes,
        s.total_passes,
        s.filtered_out,
        s.parameter_count,
        s.profitable_passes,
        s.pareto_front_size,
        s.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    if report.ranking.is_empty() {
        return;
    }

    print_ranges(report);
    print_ranking(report, config, top_n);
    print_sensitivity(report);
    print_suggestions(report);
}

fn print_ranges(report: &AnalysisReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Parameter", "Min", "Max", "Step", "Values"]);
    for range in &report.parameter_ranges {
        table.add_row(vec![
            range.label.clone(),
            optional(range.min),
            optional(range.max),
            optional(range.step),
            range.distinct_values.to_string(),
        ]);
    }
    println!("\nTested parameter ranges\n{table}");
}

fn print_ranking(report: &AnalysisReport, config: &AnalysisConfig, top_n: usize) {
    let parameters: Vec<&str> = report
        .parameter_ranges
        .iter()
        .map(|r| r.parameter.as_str())
        .collect();
    let metrics: Vec<&str> = config.weighted_metrics().map(|m| m.metric.as_str()).collect();
    let pareto: HashMap<usize, _> = report.pareto.iter().map(|r| (r.pass_id, r)).collect();

    let mut header = vec!["Rank".to_string(), "Pass".to_string()];
    header.extend(report.parameter_ranges.iter().map(|r| r.label.clone()));
    header.extend(metrics.iter().map(|m| m.to_string()));
    header.extend(["Score".to_string(), "Pareto".to_string()]);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    for (i, scored) in report.ranking.iter().take(top_n).enumerate() {
        let mut row = vec![(i + 1).to_string(), scored.id().to_string()];
        row.extend(parameters.iter().map(|p| {
            scored.pass.parameter(p).map(|v| v.to_string()).unwrap_or_default()
        }));
        row.extend(metrics.iter().map(|m| optional(scored.pass.metric(m))));
        row.push(format!("{:.4}", scored.composite_score));
        row.push(pareto_label(pareto.get(&scored.id()).copied()));
        table.add_row(row);
    }
    println!("\nTop {} passes by composite score\n{table}", top_n.min(report.ranking.len()));
}

fn print_sensitivity(report: &AnalysisReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Parameter", "Values", "Sensitivity", "Best value", "Best score"]);
    for result in &report.sensitivity {
        let best = result.levels.iter().max_by(|a, b| {
            a.aggregate_score(result.aggregate)
                .total_cmp(&b.aggregate_score(result.aggregate))
        });
        table.add_row(vec![
            result.parameter.clone(),
            result.levels.len().to_string(),
            format!("{:.4}", result.sensitivity),
            best.map(|l| l.value.to_string()).unwrap_or_default(),
            best.map(|l| format!("{:.4}", l.aggregate_score(result.aggregate)))
                .unwrap_or_default(),
        ]);
    }
    println!("\nParameter sensitivity (marginal, no interaction effects)\n{table}");
}

fn print_suggestions(report: &AnalysisReport) {
    let cards = &report.suggestions;
    println!("\nSuggestions");
    for (title, card) in [
        ("Aggressive (highest profit)", &cards.aggressive),
        ("Balanced (highest score)", &cards.balanced),
        ("Conservative (lowest drawdown)", &cards.conservative),
    ] {
        if let Some(card) = card {
            let params: Vec<String> = card
                .parameters
                .iter()
                .map(|(k, v)| format!("{}={}", analyzer::summary::display_label(k), v))
                .collect();
            println!(
                "  {title}: pass {} [{}] profit {}, sharpe {}, drawdown {}",
                card.pass_id,
                params.join(", "),
                optional(card.profit),
                optional(card.sharpe),
                optional(card.drawdown),
            );
        }
    }
    for range in &cards.robust_ranges {
        println!(
            "  Stable range for {}: {} - {} (over {} top passes)",
            analyzer::summary::display_label(&range.parameter),
            range.q1,
            range.q3,
            range.sample_count
        );
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn pareto_label(result: Option<&ParetoResult>) -> String {
    match result.map(|r| &r.status) {
        Some(ParetoStatus::Comparable { is_on_front: true, .. }) => "front".to_string(),
        Some(ParetoStatus::Comparable { front_rank, .. }) => format!("layer {}", front_rank),
        Some(ParetoStatus::Incomparable { .. }) => "incomparable".to_string(),
        None => "-".to_string(),
    }
}
