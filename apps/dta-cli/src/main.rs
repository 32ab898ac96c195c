use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use dta_app::{
    AnalysisConfig, AppError, AppResult, DataModel, LoadReport, average_phase_times,
    build_model, experiments_by_instance_and_algorithm, load_experiments, load_parameters,
    median_relative_gaps, relative_gaps, summarize_experiment, to_json_string, write_json,
};
use dta_log::ParseStats;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dta")]
#[command(about = "DTA experiment log analysis", long_about = None)]
struct Cli {
    /// Analysis config YAML (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an experiment log and list the experiments found
    Parse {
        /// Path to the experiment log
        log_path: PathBuf,
        /// Write the parsed experiments as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the instances of a parameter file
    Instances {
        /// Path to the parameter CSV file
        csv_path: PathBuf,
    },
    /// Per-experiment timing and convergence overview
    Summary {
        log_path: PathBuf,
        csv_path: PathBuf,
        /// Keep iteration 0 in the timing averages
        #[arg(long)]
        include_first: bool,
    },
    /// Relative gap per iteration for one instance
    RelGap {
        log_path: PathBuf,
        csv_path: PathBuf,
        /// Instance index
        #[arg(long)]
        instance: i64,
        /// Only this algorithm
        #[arg(long)]
        algorithm: Option<String>,
    },
    /// Average per-step phase times by instance and algorithm
    Phases {
        log_path: PathBuf,
        csv_path: PathBuf,
        /// Only this algorithm
        #[arg(long)]
        algorithm: Option<String>,
    },
    /// Export the joined data model as JSON
    Export {
        log_path: PathBuf,
        csv_path: PathBuf,
        /// Output JSON file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Log to stderr so command output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let config = AnalysisConfig::load(path)?;
            info!(path = %path.display(), "loaded analysis config");
            config
        }
        None => {
            debug!("no config given, using defaults");
            AnalysisConfig::default()
        }
    };

    match cli.command {
        Commands::Parse { log_path, output } => cmd_parse(&log_path, output.as_deref(), &config),
        Commands::Instances { csv_path } => cmd_instances(&csv_path),
        Commands::Summary {
            log_path,
            csv_path,
            include_first,
        } => {
            let skip_first = config.skip_first_iteration && !include_first;
            cmd_summary(&log_path, &csv_path, &config, skip_first)
        }
        Commands::RelGap {
            log_path,
            csv_path,
            instance,
            algorithm,
        } => cmd_rel_gap(&log_path, &csv_path, &config, instance, algorithm.as_deref()),
        Commands::Phases {
            log_path,
            csv_path,
            algorithm,
        } => cmd_phases(&log_path, &csv_path, &config, algorithm.as_deref()),
        Commands::Export {
            log_path,
            csv_path,
            output,
        } => cmd_export(&log_path, &csv_path, &config, output.as_deref()),
    }
}

fn cmd_parse(log_path: &Path, output: Option<&Path>, config: &AnalysisConfig) -> AppResult<()> {
    let parsed = load_experiments(log_path, config)?;
    print_parse_stats(&parsed.stats);

    println!("Experiments:");
    for exp in &parsed.experiments {
        println!(
            "  {} instance={} rep={} steps={} preprocessing={}",
            exp.algorithm,
            exp.instance_index,
            exp.repetition,
            exp.steps.len(),
            exp.preprocessing_phases.len()
        );
    }

    if let Some(path) = output {
        let model = DataModel::assemble(parsed.experiments, Default::default());
        write_json(&model, path)?;
        println!("✓ Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_instances(csv_path: &Path) -> AppResult<()> {
    let loaded = load_parameters(csv_path)?;
    if loaded.instances.is_empty() {
        println!("No instances found");
    } else {
        println!("Instances:");
        for (index, inst) in &loaded.instances {
            println!(
                "  [{}] {} {} aggregation={} relgap={} last_iter={} ({})",
                index,
                inst.prefix,
                inst.trip_file_name,
                inst.aggregation,
                inst.convergence_relgap,
                inst.last_iter,
                inst.filename_base()
            );
        }
    }
    for row in &loaded.rejected {
        println!("  [{}] rejected: {}", row.line_index, row.reason);
    }
    Ok(())
}

fn cmd_summary(
    log_path: &Path,
    csv_path: &Path,
    config: &AnalysisConfig,
    skip_first: bool,
) -> AppResult<()> {
    let (model, report) = build_model(log_path, csv_path, config)?;
    print_report(&report);

    let resolver = config.path_resolver()?;
    let algorithms: Vec<String> = model
        .algorithms
        .iter()
        .map(|algo| {
            if resolver.is_sampled(algo) {
                format!("{} (sampled)", algo)
            } else {
                algo.clone()
            }
        })
        .collect();
    println!("Algorithms: {}", algorithms.join(", "));
    for exp in &model.experiments {
        let s = summarize_experiment(exp, skip_first);
        let network = model
            .instance_for(exp)
            .map_or("?", |inst| inst.prefix.as_str());
        println!(
            "  {} [{} {}] rep={} steps={} routing={} simulation={} final_gap={} total={}",
            s.algorithm,
            s.instance_index,
            network,
            s.repetition,
            s.step_count,
            fmt_seconds(s.mean_routing_s),
            fmt_seconds(s.mean_simulation_s),
            fmt_value(s.final_relative_gap),
            fmt_seconds(s.total_duration_s)
        );
    }
    Ok(())
}

fn cmd_rel_gap(
    log_path: &Path,
    csv_path: &Path,
    config: &AnalysisConfig,
    instance: i64,
    algorithm: Option<&str>,
) -> AppResult<()> {
    let (model, _) = build_model(log_path, csv_path, config)?;
    let groups = experiments_by_instance_and_algorithm(&model);

    let mut found = false;
    for ((index, algo), exps) in &groups {
        if *index != instance || !matches_algorithm(algo, algorithm) {
            continue;
        }
        found = true;
        println!("{} (instance {}, {} runs)", algo, index, exps.len());
        if let [single] = exps.as_slice() {
            for (iteration, gap) in relative_gaps(single) {
                println!("  {:>4}  {:.6}", iteration, gap);
            }
        } else {
            for (iteration, gap) in median_relative_gaps(exps) {
                println!("  {:>4}  {:.6} (median)", iteration, gap);
            }
        }
    }

    if !found {
        return Err(AppError::InvalidInput(format!(
            "No experiments for instance {}",
            instance
        )));
    }
    Ok(())
}

fn cmd_phases(
    log_path: &Path,
    csv_path: &Path,
    config: &AnalysisConfig,
    algorithm: Option<&str>,
) -> AppResult<()> {
    let (model, _) = build_model(log_path, csv_path, config)?;
    let groups = experiments_by_instance_and_algorithm(&model);

    for ((index, algo), exps) in &groups {
        if !matches_algorithm(algo, algorithm) {
            continue;
        }
        let averages = average_phase_times(exps, &config.ignored_phases);
        if averages.is_empty() {
            continue;
        }
        let base = exps
            .first()
            .map_or(algo.as_str(), |exp| exp.algorithm_base.as_str());
        println!(
            "{} (instance {}; customization='{}', routing='{}')",
            algo,
            index,
            config.customization_phase(base),
            config.routing_phase(base)
        );
        for (phase, seconds) in &averages {
            println!("  {:<28} {:>10.3} s", phase, seconds);
        }
    }
    Ok(())
}

fn cmd_export(
    log_path: &Path,
    csv_path: &Path,
    config: &AnalysisConfig,
    output: Option<&Path>,
) -> AppResult<()> {
    let (model, report) = build_model(log_path, csv_path, config)?;
    match output {
        Some(path) => {
            write_json(&model, path)?;
            print_report(&report);
            println!("✓ Exported {} experiments to {}", model.experiments.len(), path.display());
        }
        None => println!("{}", to_json_string(&model)?),
    }
    Ok(())
}

fn matches_algorithm(algorithm: &str, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| dta_app::normalize_algorithm(f) == dta_app::normalize_algorithm(algorithm))
}

fn print_parse_stats(stats: &ParseStats) {
    println!(
        "Lines: {} ({} matched, {} ignored)",
        stats.lines, stats.matched, stats.ignored
    );
    if stats.synthesized_experiments > 0 {
        println!("  Experiments without start marker: {}", stats.synthesized_experiments);
    }
    if stats.orphan_phase_details + stats.orphan_steps > 0 {
        println!(
            "  Orphaned records: {} phase, {} step",
            stats.orphan_phase_details, stats.orphan_steps
        );
    }
    if stats.malformed_tokens > 0 {
        println!("  Malformed tokens: {}", stats.malformed_tokens);
    }
}

fn print_report(report: &LoadReport) {
    print_parse_stats(&report.parse_stats);
    if !report.rejected_rows.is_empty() {
        println!("  Rejected parameter rows: {}", report.rejected_rows.len());
    }
}

fn fmt_seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}s", v))
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.6}", v))
}
