//! Command line driver for the solver benchmark
//!
//! Fetches a size stratified sample of BiGG models, solves them with both backends,
//! and writes the raw results, a comparison report, and a summary table.
use std::path::PathBuf;

use fluxsuite_core::benchmark::catalog::ModelCatalog;
use fluxsuite_core::benchmark::comparator::{compare_result_sets, summarize};
use fluxsuite_core::benchmark::report::{comparison_table, write_report, DEFAULT_DETAIL_ROWS};
use fluxsuite_core::benchmark::runner::{
    export_results, results_by_solver, summarize_run, BenchmarkMethod, BenchmarkRunner,
};
use fluxsuite_core::configuration::{Configuration, SolverKind};
use fluxsuite_core::metabolic_model::model::Model;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn main() {
    if let Err(error) = run(std::env::args().skip(1).collect()) {
        eprintln!("{error}");
        std::process::exit(2);
    }
}

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Options {
    num_models: usize,
    methods: Vec<BenchmarkMethod>,
    output: PathBuf,
    cache: PathBuf,
    min_reactions: usize,
    max_reactions: usize,
    refresh: bool,
    processes: Option<u32>,
    verbose: bool,
    config: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            num_models: 20,
            methods: vec![BenchmarkMethod::Fba, BenchmarkMethod::Pfba],
            output: PathBuf::from("benchmark_results"),
            cache: PathBuf::from("model_cache"),
            min_reactions: 10,
            max_reactions: 5000,
            refresh: false,
            processes: None,
            verbose: false,
            config: None,
        }
    }
}

fn usage() -> String {
    [
        "fluxsuite-bench usage:",
        "  fluxsuite-bench [-n|--num-models <count>] [-m|--methods <method>...]",
        "      [-o|--output <dir>] [--cache <dir>] [--min-reactions <count>]",
        "      [--max-reactions <count>] [--refresh] [--processes <count>]",
        "      [--config <path>] [--verbose]",
        "",
        "  methods: fba, pfba, fva, fva_<percent>, moma, eflux",
    ]
    .join("\n")
}

/// `Ok(None)` when help was requested
fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(None),
            "-n" | "--num-models" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--num-models requires a value".to_string())?;
                options.num_models = parse_count("--num-models", value)?;
            }
            "-m" | "--methods" => {
                let mut methods = Vec::new();
                while let Some(value) = args.get(index + 1).filter(|v| !v.starts_with('-')) {
                    methods.push(
                        value
                            .parse::<BenchmarkMethod>()
                            .map_err(|error| error.to_string())?,
                    );
                    index += 1;
                }
                if methods.is_empty() {
                    return Err("--methods requires at least one method".to_string());
                }
                options.methods = methods;
            }
            "-o" | "--output" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--output requires a path".to_string())?;
                options.output = PathBuf::from(value);
            }
            "--cache" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--cache requires a path".to_string())?;
                options.cache = PathBuf::from(value);
            }
            "--config" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--min-reactions" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--min-reactions requires a value".to_string())?;
                options.min_reactions = parse_count("--min-reactions", value)?;
            }
            "--max-reactions" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--max-reactions requires a value".to_string())?;
                options.max_reactions = parse_count("--max-reactions", value)?;
            }
            "--processes" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--processes requires a value".to_string())?;
                options.processes = Some(parse_count("--processes", value)? as u32);
            }
            "--refresh" => options.refresh = true,
            "-v" | "--verbose" => options.verbose = true,
            flag => return Err(format!("unknown flag: {flag}\n\n{}", usage())),
        }
        index += 1;
    }
    Ok(Some(options))
}

fn parse_count(flag: &str, value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|_| format!("invalid {flag} '{value}', expected a non-negative integer"))
}

fn run(args: Vec<String>) -> Result<(), String> {
    let options = match parse_args(&args)? {
        Some(options) => options,
        None => {
            println!("{}", usage());
            return Ok(());
        }
    };
    let level = if options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .map_err(|error| format!("failed to set up logging: {error}"))?;

    let mut config = match &options.config {
        Some(path) => Configuration::load_or_default(path),
        None => Configuration::default(),
    };
    if let Some(processes) = options.processes {
        config.processes = processes;
    }

    let catalog = ModelCatalog::new(&options.cache).map_err(|error| error.to_string())?;
    let selected = catalog
        .get_benchmark_models(
            options.min_reactions,
            options.max_reactions,
            options.num_models,
            options.refresh,
        )
        .map_err(|error| format!("failed to fetch the model catalog: {error}"))?;
    log::info!("Selected {} models", selected.len());

    let models: Vec<(String, Model)> = selected
        .iter()
        .filter_map(|info| {
            catalog
                .load_model(&info.bigg_id, &config)
                .map(|model| (info.bigg_id.clone(), model))
        })
        .collect();
    if models.is_empty() {
        return Err("no models could be loaded".to_string());
    }

    let runner = BenchmarkRunner::new(&config, &[SolverKind::Clarabel, SolverKind::Microlp])
        .map_err(|error| error.to_string())?;
    log::info!(
        "Running {} models with {}",
        models.len(),
        runner.solver_names().join(", ")
    );
    let results = runner.run(&models, &options.methods);
    let run_summary = summarize_run(&results, models.len(), &options.methods);
    export_results(&results, &run_summary, &options.output).map_err(|error| error.to_string())?;
    log::info!(
        "{} results, {} optimal, {} errors",
        run_summary.num_results,
        run_summary.optimal_count,
        run_summary.error_count
    );

    let by_solver = results_by_solver(&results);
    let (reference, candidate) = match (by_solver.get_index(0), by_solver.get_index(1)) {
        (Some(reference), Some(candidate)) => (reference, candidate),
        _ => return Err("need results from two solvers to compare".to_string()),
    };
    let comparisons = compare_result_sets(reference.1, candidate.1);
    let summary = summarize(&comparisons);
    let report_path = options
        .output
        .join(format!("comparison_{}.md", run_summary.timestamp));
    write_report(&report_path, &summary, &comparisons, DEFAULT_DETAIL_ROWS)
        .map_err(|error| error.to_string())?;

    comparison_table(&comparisons, DEFAULT_DETAIL_ROWS).printstd();
    log::info!(
        "{} vs {}: {}/{} comparisons passed ({:.1}%)",
        reference.0,
        candidate.0,
        summary.passed,
        summary.total_comparisons,
        summary.pass_rate * 100.
    );
    Ok(())
}
