use std::fmt::Display;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use indicatif::ProgressBar;

use sftp_relay::cli::Cli;
use sftp_relay::config::Config;
use sftp_relay::error::ConfigError;
use sftp_relay::server::show_status_table;
use sftp_relay::transfer::enumeration::classify_source;
use sftp_relay::transfer::{
    FailoverScheduler, ThreadSleeper, UploadExecutor, build_jobs, probe_endpoints, run_jobs,
};
use sftp_relay::{logging, util};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // configuration problems abort before any job is attempted
    if !cli.check && cli.locations.is_empty() {
        usage_error(ConfigError::NoSources);
    }
    let mut config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => usage_error(e),
    };
    if let Some(n) = cli.max_retries {
        if n == 0 {
            usage_error(ConfigError::InvalidRetries);
        }
        config.max_retries = n;
    }
    if let Some(ms) = cli.backoff_ms {
        config.backoff_base_ms = ms;
    }

    let _guards = match logging::init(&config.log_dir, cli.verbose) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("❌ cannot initialise logs in {}: {:#}", config.log_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn usage_error(e: impl Display) -> ! {
    Cli::command().error(ErrorKind::ValueValidation, e).exit()
}

fn run(cli: &Cli, config: &Config) -> anyhow::Result<ExitCode> {
    let mut pool = config.pool()?;
    let credentials = config.credentials(&cli.user);
    let client = config.client();

    if cli.check {
        let rows = probe_endpoints(&client, pool.endpoints(), &credentials);
        show_status_table(&rows)?;
        return Ok(ExitCode::SUCCESS);
    }

    let jobs = build_jobs(&cli.locations, &cli.remote_dir, credentials);
    // every job still runs so each bad location lands in the report
    let any_valid = jobs.iter().any(|j| classify_source(&j.source).is_ok());
    let sleeper = ThreadSleeper;
    let executor = UploadExecutor::new(&client, &sleeper, config.backoff(), config.max_retries);
    let scheduler = FailoverScheduler::new(executor);

    let pb = if cli.json || cli.quiet {
        ProgressBar::hidden()
    } else {
        util::init_job_progress(jobs.len() as u64, config.max_retries, config.backoff_base_ms)
            .with_context(|| "invalid progress template")?
    };
    let start = Instant::now();
    let report = run_jobs(&scheduler, &mut pool, &jobs, |outcome| {
        pb.set_message(outcome.source.display().to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();
    let elapsed = start.elapsed().as_secs_f64();

    let failures_path = match report.write_failures_jsonl(&config.failures_path()) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("cannot write {}: {}", config.failures_path().display(), e);
            None
        }
    };

    let audit_log = config.audit_log_path();
    if cli.json {
        println!("{}", report.to_json(elapsed, &audit_log));
    } else {
        if !cli.quiet {
            report.print_table()?;
        }
        println!("{}", report.summary_line(&audit_log));
        if let Some(p) = failures_path {
            println!("Failed jobs written to: {}", p.display());
        }
    }

    if !any_valid {
        eprintln!("❌ {}", ConfigError::NoValidSources);
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
