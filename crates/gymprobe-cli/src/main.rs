//! Gymprobe CLI: run the Gym System UI suite
//!
//! ## Usage
//!
//! ```bash
//! gymprobe run                          # Run the suite in headless Chromium
//! gymprobe run --filter CT-00 --headed  # Watch the admin scenarios
//! gymprobe run --simulate -o out.json   # In-memory run with a JSON report
//! gymprobe list                         # Show the scenario catalog
//! gymprobe config -c gym.yaml           # Print the effective configuration
//! ```

use clap::Parser;
use gymprobe::prelude::*;
use gymprobe_cli::{
    init_tracing, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, ConfigArgs,
    ListArgs, ProgressReporter, RunArgs, Verbosity,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config)?;

    match cli.command {
        Commands::Run(args) => run_suite(&config, &args),
        Commands::List(args) => {
            run_list(&args);
            Ok(())
        }
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(ColorChoice::from(cli.color.clone()))
        .with_json_logs(cli.json_logs)
}

fn load_harness_config(args: &RunArgs) -> CliResult<HarnessConfig> {
    let mut config = HarnessConfig::load(args.config.as_deref())?;
    if let Some(url) = &args.base_url {
        config.base_url.clone_from(url);
    }
    if args.headed {
        config.browser.headless = false;
    }
    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}

fn run_suite(cli_config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = gymprobe::install(load_harness_config(args)?)?;
    debug!(base_url = %config.base_url, simulate = args.simulate, "configuration ready");

    if args.simulate {
        let simulator = GymAppSimulator::from_config(config)?;
        execute(cli_config, args, config, SimulatorFactory::new(simulator))
    } else {
        let factory = ChromiumFactory::new(config.browser.clone());
        execute(cli_config, args, config, factory)
    }
}

fn execute(
    cli_config: &CliConfig,
    args: &RunArgs,
    config: &HarnessConfig,
    factory: impl DriverFactory + 'static,
) -> CliResult<()> {
    let mut runner = ScenarioRunner::new(config.clone(), factory)?.with_fail_fast(args.fail_fast);
    if let Some(filter) = &args.filter {
        runner = runner.with_filter(filter.clone());
    }

    let suite = default_suite();
    let selected = runner.select(&suite).len();
    if selected == 0 {
        return Err(CliError::config(format!(
            "no scenario matches filter '{}'",
            args.filter.as_deref().unwrap_or_default()
        )));
    }

    let mut reporter = ProgressReporter::new(
        cli_config.color.should_color(),
        cli_config.verbosity.is_quiet(),
    );
    reporter.header(&format!("Gym System suite against {}", config.base_url));
    reporter.start_progress(selected as u64, "starting");
    let results = runner.run_suite_with(&suite, |result| reporter.scenario_finished(result));
    reporter.finish();
    reporter.summary(
        results.passed_count(),
        results.failed_count(),
        results.skipped,
        Duration::from_millis(results.duration_ms),
    );

    if let Some(path) = &args.report {
        std::fs::write(path, results.to_json()?)?;
        info!(path = %path.display(), "report written");
        reporter.info(&format!("Report written to {}", path.display()));
    }

    if results.all_passed() {
        Ok(())
    } else {
        Err(CliError::scenario_failure(format!(
            "{} of {} scenarios failed, {} skipped",
            results.failed_count(),
            results.total(),
            results.skipped
        )))
    }
}

fn run_list(args: &ListArgs) {
    for scenario in default_suite()
        .iter()
        .filter(|s| args.filter.as_deref().map_or(true, |f| s.matches(f)))
    {
        println!(
            "{:<11} {:<13} {}",
            scenario.id(),
            scenario.role().as_str(),
            scenario.title()
        );
    }
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let config = HarnessConfig::load(args.config.as_deref())?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
