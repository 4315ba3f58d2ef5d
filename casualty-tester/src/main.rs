mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use casualty_sim::Mechanism;
use logic::{
    DEFAULT_TICKS, LogicTester, ScenarioResult, expand_scenarios, get_scenario, list_scenarios,
    resolve_mechanisms, resolve_seed_inputs, run_case,
};

#[derive(Debug, Parser)]
#[command(name = "casualty-tester", version = "0.1.0")]
#[command(about = "Headless QA runs for the casualty-care trainer engine")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "untreated,doctrine")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Injury mechanisms to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    mechanisms: String,

    /// Seeds to run (comma-separated; decimal, 0x hex, or `now`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario, mechanism and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Simulated seconds per run
    #[arg(long, default_value_t = DEFAULT_TICKS)]
    ticks: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write a session export of the first scenario run to this path
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&split_csv(&args.scenarios));
    let mechanisms = resolve_mechanisms(&split_csv(&args.mechanisms))?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    log::info!(
        "running {} scenario(s) across {} mechanism(s) and {} seed(s)",
        scenarios.len(),
        mechanisms.len(),
        seeds.len()
    );

    let results = run_scenarios(&args, &scenarios, &mechanisms, &seeds);

    if let Some(path) = args.export.as_deref() {
        export_first_run(path, &args, &scenarios, &mechanisms, &seeds)?;
    }

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:15} - {description}")?;
    }
    writeln!(output_target.writer(), "Mechanisms:")?;
    for mechanism in Mechanism::ALL {
        writeln!(output_target.writer(), "  {mechanism}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🩸 Casualty Trainer Tester".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn run_scenarios(
    args: &Args,
    scenarios: &[String],
    mechanisms: &[Mechanism],
    seeds: &[u64],
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Casualty Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(args.verbose, args.ticks);
    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(&scenario, mechanisms, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn export_first_run(
    path: &Path,
    args: &Args,
    scenarios: &[String],
    mechanisms: &[Mechanism],
    seeds: &[u64],
) -> Result<()> {
    let Some(scenario) = scenarios.iter().find_map(|name| get_scenario(name)) else {
        bail!("no known scenario to export");
    };
    let (Some(&mechanism), Some(&seed)) = (mechanisms.first(), seeds.first()) else {
        bail!("no mechanism or seed to export");
    };
    let summary = run_case(&scenario.plan, mechanism, seed, args.ticks)?;
    let json = summary
        .session
        .export()
        .with_timestamp(chrono::Utc::now().to_rfc3339())
        .to_json()?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "💾 Exported {} ({mechanism}, seed {seed}) to {}",
        scenario.name,
        path.display()
    );
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Casualty Run Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            scenarios: "fuzz".to_string(),
            list_scenarios: false,
            mechanisms: "blast".to_string(),
            seeds: "1".to_string(),
            iterations: 1,
            ticks: 30,
            report: "json".to_string(),
            verbose: false,
            output: None,
            export: None,
        }
    }

    #[test]
    fn split_csv_trims_and_drops_empties() {
        assert_eq!(split_csv(" a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["casualty-tester"]);
        assert_eq!(args.scenarios, "untreated,doctrine");
        assert_eq!(args.mechanisms, "all");
        assert_eq!(args.ticks, DEFAULT_TICKS);
        assert_eq!(args.report, "console");
    }

    #[test]
    fn run_scenarios_skips_unknown_names() {
        let args = base_args();
        let scenarios = vec!["fuzz".to_string(), "bogus".to_string()];
        let results = run_scenarios(&args, &scenarios, &[Mechanism::Blast], &[1]);
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
    }

    #[test]
    fn reports_write_to_a_file_target() {
        let path = std::env::temp_dir().join(format!(
            "casualty-tester-report-{}.json",
            std::process::id()
        ));
        let mut args = base_args();
        args.output = Some(path.clone());
        let results = run_scenarios(&args, &["fuzz".to_string()], &[Mechanism::Mvc], &[2]);
        write_reports(&args, &results, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        let _ = std::fs::remove_file(path);
    }
}
