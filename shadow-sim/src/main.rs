mod reports;
mod scenarios;
mod util;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use scenarios::{ScenarioKind, ScenarioResult, SimPlan, list_scenarios, run_all};
use util::{parse_seeds, split_csv};

#[derive(Debug, Parser)]
#[command(name = "shadow-sim", version)]
#[command(about = "Scenario driver for the Shadow Empire economic core")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "idle")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Players simulated per scenario
    #[arg(long, default_value_t = 8)]
    players: u64,

    /// Iterations per scenario
    #[arg(long, default_value_t = 24)]
    iterations: usize,

    /// Simulated seconds between idle collections
    #[arg(long, default_value_t = 900.0)]
    step_secs: f64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn plan(&self) -> Result<SimPlan> {
        ensure!(self.players > 0, "--players must be at least 1");
        ensure!(
            self.step_secs.is_finite() && self.step_secs > 0.0,
            "--step-secs must be a positive number"
        );
        Ok(SimPlan {
            players: self.players,
            iterations: self.iterations,
            step_secs: self.step_secs,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }
    if args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    let plan = args.plan()?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    let results = run_all(&scenarios, &seeds, plan).await?;

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
        writeln!(output_target.writer(), "  {key:12} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🕶️  Shadow Empire Economy Simulator".bright_cyan().bold());
    println!("{}", "==================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for kind in ScenarioKind::ALL {
            if !scenarios.iter().any(|s| s == kind.key()) {
                scenarios.push(kind.key().to_string());
            }
        }
    }
    scenarios
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    if args.report.as_str() == "json" {
        reports::generate_json_report(&mut output_target, results)?;
    } else if results.is_empty() {
        writeln!(&mut output_target, "No scenarios executed.")?;
    } else {
        reports::generate_console_report(&mut output_target, results, start_time.elapsed())?;
        writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
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
