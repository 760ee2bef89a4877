//! payout-runner: headless payout run over exported video records.
//!
//! Usage:
//!   payout-runner --roster creators.tsv --records videos.json
//!   payout-runner --registry creators.json --records videos.json --mode summed --out report.json
//!   payout-runner --roster creators.tsv --records videos.json --compare --base-rate 40
//!   payout-runner --roster creators.tsv --records videos.json --db payouts.db

use anyhow::{bail, Context, Result};
use payout_core::{
    bonus::BonusMode,
    config::PayoutConfig,
    money::Cents,
    pipeline::{ModeComparison, PayoutReport, Pipeline},
    record::RawVideoRecord,
    registry::{CreatorRecord, CreatorRegistry, SharedRegistry},
    roster::load_roster,
    store::ReportStore,
    types::RunId,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let roster = flag_value(&args, "--roster");
    let registry_json = flag_value(&args, "--registry");
    let Some(records_path) = flag_value(&args, "--records") else {
        bail!("--records <file> is required");
    };
    let config_path = flag_value(&args, "--config");
    let mode = flag_value(&args, "--mode");
    let base_rate = flag_value(&args, "--base-rate");
    let out = flag_value(&args, "--out");
    let db = flag_value(&args, "--db");
    let compare = args.iter().any(|a| a == "--compare");

    println!("payout-runner: creator payouts");
    println!("  records:  {records_path}");
    println!("  creators: {}", roster.or(registry_json).unwrap_or("(none)"));
    println!("  config:   {}", config_path.unwrap_or("(defaults)"));
    println!();

    let registry = match (roster, registry_json) {
        (Some(_), Some(_)) => bail!("pass either --roster or --registry, not both"),
        (Some(path), None) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {path}"))?;
            load_roster(&text)?
        }
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {path}"))?;
            let creators: Vec<CreatorRecord> = serde_json::from_str(&text)?;
            CreatorRegistry::from_records(creators)?
        }
        (None, None) => bail!("--roster <file> or --registry <file> is required"),
    };
    let shared = SharedRegistry::new(registry);

    let mut config = match config_path {
        Some(path) => PayoutConfig::load(path)?,
        None => PayoutConfig::default(),
    };
    if let Some(mode) = mode {
        let mode: BonusMode = mode.parse().map_err(anyhow::Error::msg)?;
        config = config.with_mode(mode);
    }
    if let Some(rate) = base_rate {
        let rate: Cents = rate.parse().map_err(anyhow::Error::msg)?;
        config = config.with_base_rate(rate);
        config.validate()?;
    }

    let text = std::fs::read_to_string(records_path)
        .with_context(|| format!("Cannot read {records_path}"))?;
    let records: Vec<RawVideoRecord> = serde_json::from_str(&text)?;
    log::info!("runner: {} record(s) loaded from {records_path}", records.len());

    let pipeline = Pipeline::new(shared.snapshot(), config.clone());

    if compare {
        let comparison = pipeline.compare(&records)?;
        print_comparison(&comparison);
        if let Some(path) = out {
            std::fs::write(path, serde_json::to_string_pretty(&comparison)?)?;
            println!("\n  comparison written to {path}");
        }
        if let Some(db) = db {
            persist(db, &comparison.individual, &config.clone().with_mode(BonusMode::Individual))?;
            persist(db, &comparison.summed, &config.with_mode(BonusMode::Summed))?;
        }
        return Ok(());
    }

    let report = pipeline.run(&records)?;
    print_summary(&report);
    if let Some(path) = out {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("\n  report written to {path}");
    }
    if let Some(db) = db {
        persist(db, &report, &config)?;
    }
    Ok(())
}

fn persist(db: &str, report: &PayoutReport, config: &PayoutConfig) -> Result<()> {
    let store = ReportStore::open(db)?;
    store.migrate()?;
    let run_id: RunId = format!("payout-{}", uuid::Uuid::new_v4());
    let created_at = chrono::Utc::now().to_rfc3339();
    store.save_report(&run_id, report, config, &created_at)?;
    println!("  saved {} run as {run_id} in {db}", report.bonus_mode);
    Ok(())
}

fn print_summary(report: &PayoutReport) {
    println!("=== PAYOUT SUMMARY ({} mode) ===", report.bonus_mode);
    println!(
        "  {:<24} {:>6} {:>6} {:>12} {:>12} {:>12} {:>12}",
        "creator", "videos", "qual", "views", "base", "bonus", "total"
    );
    for b in &report.breakdowns {
        println!(
            "  {:<24} {:>6} {:>6} {:>12} {:>12} {:>12} {:>12}",
            b.display_name,
            b.unique_video_count,
            b.qualified_video_count,
            b.total_views,
            b.base_cost.to_string(),
            b.bonus_cost.to_string(),
            b.total_cost.to_string()
        );
    }
    let t = &report.totals;
    println!();
    println!("  creators:        {}", t.creators);
    println!("  unique videos:   {}", t.unique_videos);
    println!("  qualified:       {}", t.qualified_videos);
    println!("  total views:     {}", t.total_views);
    println!("  base cost:       {}", t.base_cost);
    println!("  bonus cost:      {}", t.bonus_cost);
    println!("  total cost:      {}", t.total_cost);
    println!("  cost per 1k:     {}", t.cost_per_mille);
    println!("  unmatched:       {}", report.unmatched.len());

    if !report.diagnostics.is_empty() {
        println!();
        println!("=== DIAGNOSTICS ===");
        for d in &report.diagnostics {
            println!("  {d}");
        }
    }
}

fn print_comparison(comparison: &ModeComparison) {
    let (a, b) = (&comparison.individual, &comparison.summed);
    println!("=== MODE COMPARISON ===");
    println!("  {:<24} {:>14} {:>14}", "creator", "individual", "summed");
    for ind in &a.breakdowns {
        let summed = b
            .breakdown(&ind.creator_id)
            .map(|s| s.total_cost.to_string())
            .unwrap_or_default();
        println!(
            "  {:<24} {:>14} {:>14}",
            ind.display_name,
            ind.total_cost.to_string(),
            summed
        );
    }
    println!();
    println!(
        "  {:<24} {:>14} {:>14}",
        "TOTAL",
        a.totals.total_cost.to_string(),
        b.totals.total_cost.to_string()
    );
    println!("  difference (summed - individual): {}", comparison.difference());
    println!("  cheaper mode: {}", comparison.cheaper());
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
