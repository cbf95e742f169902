// 💧 jal-drishti CLI
// Thin presentation layer: load records, hand them to the library, print.
// Reports go to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jal_drishti::{
    load_records, prioritize, Alert, AlertEngine, Assessment, BudgetPlanner, CoverageTracker,
    GroundwaterMonitor, QualityGrader, RainfallAnalyzer, RawFhtcStatus, RawGroundwaterLevel,
    QualitySample, RawQualityReport, RawRainfallRecord, RawWaterSource, SourceRegistry,
    Thresholds, VERSION,
};

const VERIFY_NOTE: &str = "Verify water data with local authorities before making decisions.";

#[derive(Parser)]
#[command(name = "jal-drishti", version = VERSION)]
#[command(about = "Water resource monitoring for gram panchayats (Jal Jeevan Mission)")]
struct Cli {
    /// JSON file overriding any of the default thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register and analyze water sources
    Source {
        #[arg(long)]
        input: PathBuf,
    },
    /// Grade water quality test reports
    Quality {
        #[arg(long)]
        input: PathBuf,
    },
    /// Functional household tap connection coverage
    Fhtc {
        #[arg(long)]
        input: PathBuf,
    },
    /// Groundwater history, trend and recharge for one panchayat
    Groundwater {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        panchayat: String,
    },
    /// Annual rainfall deviation and drought/flood risk
    Rainfall {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        panchayat: String,
        #[arg(long)]
        year: i32,
    },
    /// Daily water demand against supply
    Budget {
        #[arg(long)]
        population: u64,
        #[arg(long, default_value_t = 0)]
        livestock: u64,
        #[arg(long = "irrigated-ha", default_value_t = 0.0)]
        irrigated_ha: f64,
        #[arg(long = "supply-lpd", default_value_t = 0.0)]
        supply_lpd: f64,
    },
    /// Full assessment of one panchayat across every loaded data set
    Assess {
        #[arg(long)]
        panchayat: String,
        #[arg(long)]
        population: u64,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        sources: Option<PathBuf>,
        #[arg(long)]
        fhtc: Option<PathBuf>,
        #[arg(long)]
        groundwater: Option<PathBuf>,
        #[arg(long)]
        rainfall: Option<PathBuf>,
        #[arg(long)]
        quality: Option<PathBuf>,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let thresholds = match &cli.config {
        Some(path) => Thresholds::from_file(path)?,
        None => Thresholds::default(),
    };
    debug!(?thresholds, "thresholds loaded");

    match cli.command {
        Command::Source { input } => run_source(&input, &thresholds),
        Command::Quality { input } => run_quality(&input, &thresholds),
        Command::Fhtc { input } => run_fhtc(&input, &thresholds),
        Command::Groundwater { input, panchayat } => {
            run_groundwater(&input, &panchayat, &thresholds)
        }
        Command::Rainfall { input, panchayat, year } => {
            run_rainfall(&input, &panchayat, year, &thresholds)
        }
        Command::Budget {
            population,
            livestock,
            irrigated_ha,
            supply_lpd,
        } => run_budget(population, livestock, irrigated_ha, supply_lpd, &thresholds),
        Command::Assess {
            panchayat,
            population,
            year,
            sources,
            fhtc,
            groundwater,
            rainfall,
            quality,
            json,
        } => {
            let inputs = AssessInputs {
                sources,
                fhtc,
                groundwater,
                rainfall,
                quality,
            };
            run_assess(&panchayat, population, year, &inputs, json, &thresholds)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "jal_drishti=debug" } else { "jal_drishti=info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn engine(thresholds: &Thresholds) -> AlertEngine {
    AlertEngine::with_config(thresholds.alerts.clone(), thresholds.bis.clone())
}

fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        return;
    }
    println!("\n🚨 Alerts ({}):", alerts.len());
    for alert in alerts {
        println!("  {}", alert);
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_source(input: &Path, thresholds: &Thresholds) -> Result<()> {
    let sources = load_records::<RawWaterSource>(input)
        .with_context(|| format!("Failed to load water sources from {}", input.display()))?;

    let mut registry = SourceRegistry::new();
    let first_panchayat = sources.first().map(|s| s.panchayat_id.clone());

    for source in sources {
        let status = if source.functional { "Functional" } else { "Non-functional" };
        println!("  [{}] {} ({})", status, source.name, source.source_type);
        println!(
            "    Yield: {:.0} LPD ({:.0}% capacity)",
            source.yield_lpd,
            source.yield_pct()
        );
        registry.register(source);
    }

    let Some(pid) = first_panchayat else {
        println!("No sources in {}", input.display());
        return Ok(());
    };

    println!(
        "\nTotal supply for {}: {:.0} liters/day",
        pid,
        registry.total_supply(&pid)
    );

    let low = registry.low_yield(&pid, thresholds.supply.low_yield_pct);
    if !low.is_empty() {
        println!("Low yield sources ({}):", low.len());
        for s in low {
            println!("  - {}: {:.0}% capacity", s.name, s.yield_pct());
        }
    }

    Ok(())
}

fn run_quality(input: &Path, thresholds: &Thresholds) -> Result<()> {
    let samples = load_records::<RawQualityReport>(input)
        .with_context(|| format!("Failed to load quality reports from {}", input.display()))?;

    let grader = QualityGrader::with_limits(thresholds.bis.clone());
    let mut engine = engine(thresholds);
    let mut alerts = Vec::new();

    for sample in &samples {
        println!();
        for line in sample_report(&grader, sample) {
            println!("{}", line);
        }
        alerts.extend(engine.check_quality(sample));
    }

    print_alerts(&prioritize(alerts));
    Ok(())
}

/// Grade line, then contaminants and treatments. Each list prints under its
/// header only when it has entries.
fn sample_report(grader: &QualityGrader, sample: &QualitySample) -> Vec<String> {
    let mut lines = vec![format!(
        "🧪 {} ({}): {}",
        sample.source_id,
        sample.date,
        grader.grade(sample).as_str().to_uppercase()
    )];

    let contaminants = grader.identify_contaminants(sample);
    if !contaminants.is_empty() {
        lines.push("  Contaminants:".to_string());
        lines.extend(contaminants.iter().map(|c| format!("    - {}", c)));
    }

    let treatments = grader.recommend_treatment(sample);
    if !treatments.is_empty() {
        lines.push("  Recommended treatment:".to_string());
        lines.extend(treatments.iter().map(|t| format!("    - {}", t)));
    }

    lines
}

fn run_fhtc(input: &Path, thresholds: &Thresholds) -> Result<()> {
    let statuses = load_records::<RawFhtcStatus>(input)
        .with_context(|| format!("Failed to load FHTC status from {}", input.display()))?;

    let mut tracker = CoverageTracker::with_standards(thresholds.supply.clone());
    for status in statuses {
        tracker.update(status);
    }

    for s in tracker.all() {
        let label = if s.panchayat_name.is_empty() { &s.panchayat_id } else { &s.panchayat_name };
        println!("\n🚰 {} ({})", label, s.panchayat_id);
        println!(
            "  Coverage: {}% ({}/{} households)",
            s.coverage_pct(),
            s.connections_provided,
            s.total_households
        );
        println!("  Functional: {}%", s.functional_pct());
        println!("  Gap: {} households", s.gap());
    }

    let summary = tracker.summary();
    println!("\n📊 Average coverage: {}%", summary.avg_coverage_pct);
    println!("📊 Average functional: {}%", summary.avg_functional_pct);

    let below = tracker.below_default_target();
    if !below.is_empty() {
        println!(
            "Below {}% target: {}",
            thresholds.supply.coverage_target_pct,
            below
                .iter()
                .map(|s| s.panchayat_id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

fn run_groundwater(input: &Path, panchayat: &str, thresholds: &Thresholds) -> Result<()> {
    let readings = load_records::<RawGroundwaterLevel>(input)
        .with_context(|| format!("Failed to load groundwater levels from {}", input.display()))?;

    let mut monitor = GroundwaterMonitor::with_bands(thresholds.groundwater.clone());
    for reading in readings {
        monitor.add(reading);
    }

    println!("⛏️  Groundwater history for {}:", panchayat);
    for r in monitor.by_panchayat(panchayat) {
        println!(
            "  {} {}: {}m [{}] (change {}m)",
            r.year,
            r.season,
            r.depth_m,
            monitor.categorize(r.depth_m),
            r.change_m()
        );
    }

    println!(
        "\nDeclining trend: {}",
        if monitor.declining_trend_default(panchayat) { "YES" } else { "no" }
    );
    println!("Recharge potential: {}", monitor.recharge_potential(panchayat));

    if let Some(latest) = monitor.latest(panchayat) {
        let alerts = engine(thresholds).check_groundwater(latest);
        print_alerts(&prioritize(alerts));
    }

    Ok(())
}

fn run_rainfall(input: &Path, panchayat: &str, year: i32, thresholds: &Thresholds) -> Result<()> {
    let records = load_records::<RawRainfallRecord>(input)
        .with_context(|| format!("Failed to load rainfall records from {}", input.display()))?;

    let mut analyzer = RainfallAnalyzer::with_bands(thresholds.rainfall.clone());
    for record in records {
        analyzer.add(record);
    }

    let deviation = analyzer.annual_deviation_pct(panchayat, year);
    println!("🌧️  Rainfall for {} ({}):", panchayat, year);
    println!(
        "  Total: {}mm (normal {}mm)",
        analyzer.annual_total(panchayat, year),
        analyzer.annual_normal(panchayat, year)
    );
    println!("  Deviation: {}%", deviation);
    println!("  Drought risk: {}", analyzer.classify_drought(deviation));
    println!("  Flood risk: {}", analyzer.classify_flood(deviation));

    let monsoon = analyzer.monsoon_performance(panchayat, year);
    println!(
        "  Monsoon: {}mm vs {}mm normal ({}%)",
        monsoon.actual_mm, monsoon.normal_mm, monsoon.deviation_pct
    );

    print_alerts(&engine(thresholds).check_rainfall(panchayat, deviation));
    Ok(())
}

fn run_budget(
    population: u64,
    livestock: u64,
    irrigated_ha: f64,
    supply_lpd: f64,
    thresholds: &Thresholds,
) -> Result<()> {
    let planner = BudgetPlanner::with_standards(thresholds.supply.clone());
    let budget = planner
        .estimate_demand(population, livestock, irrigated_ha)
        .with_supply(supply_lpd);

    println!("📊 Water budget (litres/day):");
    println!("  Domestic:    {:.0}", budget.domestic_lpd);
    println!("  Agriculture: {:.0}", budget.agriculture_lpd);
    println!("  Total demand: {:.0}", budget.total_demand_lpd);
    println!("  Supply:      {:.0}", budget.total_supply_lpd);

    let balance = budget.surplus_deficit();
    let label = if budget.is_deficit() { "Deficit" } else { "Surplus" };
    println!("  {}: {:.0}", label, balance.abs());
    println!("  Sustainability index: {}", planner.sustainability_index(&budget));

    let tracker = CoverageTracker::with_standards(thresholds.supply.clone());
    let lpcd = tracker.lpcd_check("", population, supply_lpd);
    println!(
        "  LPCD: {} (standard {}, gap {:.0} LPD)",
        lpcd.actual_lpcd, lpcd.required_lpcd, lpcd.gap_lpd
    );

    print_alerts(&engine(thresholds).check_supply(population, supply_lpd));
    println!("\n{}", VERIFY_NOTE);
    Ok(())
}

struct AssessInputs {
    sources: Option<PathBuf>,
    fhtc: Option<PathBuf>,
    groundwater: Option<PathBuf>,
    rainfall: Option<PathBuf>,
    quality: Option<PathBuf>,
}

fn run_assess(
    panchayat: &str,
    population: u64,
    year: i32,
    inputs: &AssessInputs,
    json: bool,
    thresholds: &Thresholds,
) -> Result<()> {
    let mut sources = SourceRegistry::new();
    if let Some(path) = &inputs.sources {
        for s in load_records::<RawWaterSource>(path)
            .with_context(|| format!("Failed to load water sources from {}", path.display()))?
        {
            sources.register(s);
        }
    }

    let mut coverage = CoverageTracker::with_standards(thresholds.supply.clone());
    if let Some(path) = &inputs.fhtc {
        for s in load_records::<RawFhtcStatus>(path)
            .with_context(|| format!("Failed to load FHTC status from {}", path.display()))?
        {
            coverage.update(s);
        }
    }

    let mut groundwater = GroundwaterMonitor::with_bands(thresholds.groundwater.clone());
    if let Some(path) = &inputs.groundwater {
        for r in load_records::<RawGroundwaterLevel>(path)
            .with_context(|| format!("Failed to load groundwater levels from {}", path.display()))?
        {
            groundwater.add(r);
        }
    }

    let mut rainfall = RainfallAnalyzer::with_bands(thresholds.rainfall.clone());
    if let Some(path) = &inputs.rainfall {
        for r in load_records::<RawRainfallRecord>(path)
            .with_context(|| format!("Failed to load rainfall records from {}", path.display()))?
        {
            rainfall.add(r);
        }
    }

    let samples = match &inputs.quality {
        Some(path) => load_records::<RawQualityReport>(path)
            .with_context(|| format!("Failed to load quality reports from {}", path.display()))?,
        None => Vec::new(),
    };

    let mut assessment =
        Assessment::with_thresholds(&sources, &coverage, &groundwater, &rainfall, thresholds);
    let report = assessment.run(panchayat, population, year, &samples);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    println!("🧭 Assessment for {} ({})", report.panchayat_id, report.year);
    println!(
        "  Supply: {:.0} LPD from {} functional source(s), {} non-functional",
        report.total_supply_lpd, report.functional_sources, report.non_functional_sources
    );
    println!(
        "  LPCD: {} (standard {})",
        report.lpcd.actual_lpcd, report.lpcd.required_lpcd
    );
    if let (Some(cov), Some(func)) = (report.coverage_pct, report.functional_pct) {
        println!(
            "  Coverage: {}%, functional {}%, {} households without tap",
            cov, func, report.households_without_tap
        );
    }
    if let Some(grade) = report.worst_grade {
        println!("  Worst water quality grade: {}", grade);
    }
    if let (Some(depth), Some(category)) = (report.latest_depth_m, report.depth_category) {
        println!(
            "  Groundwater: {}m [{}], recharge {}",
            depth, category, report.recharge_potential
        );
    }
    println!(
        "  Rainfall deviation: {}% ({}, {})",
        report.rainfall_deviation_pct, report.drought_risk, report.flood_risk
    );

    print_alerts(&report.alerts);
    println!("\n{}", VERIFY_NOTE);
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
