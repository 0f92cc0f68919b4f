// transfer module: job model and the sequential run loop over the job list
pub mod backoff;
pub mod enumeration;
pub mod executor;
pub mod helpers;
pub mod scheduler;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

pub use backoff::{BackoffPolicy, RetryMachine, RetryState, Sleeper, ThreadSleeper};
pub use enumeration::SourceKind;
pub use executor::{Attempt, AttemptOutcome, EndpointResult, UploadExecutor};
pub use helpers::{flattened_remote_path, normalize_path};
pub use scheduler::FailoverScheduler;
pub use session::{Credentials, RemoteSession, Ssh2Client, TransferClient, probe_endpoints};

use crate::logging::AUDIT_TARGET;
use crate::pool::DestinationPool;
use crate::report::{ResultAggregator, RunReport, UploadOutcome};

/// One upload unit. Remote directory and credentials are shared by every job
/// of a run.
#[derive(Debug, Clone)]
pub struct Job {
    pub source: PathBuf,
    pub remote_dir: String,
    pub credentials: Arc<Credentials>,
}

/// Builds one job per location, keeping the caller's order.
pub fn build_jobs(locations: &[String], remote_dir: &str, credentials: Credentials) -> Vec<Job> {
    let credentials = Arc::new(credentials);
    locations
        .iter()
        .map(|loc| Job {
            source: PathBuf::from(loc),
            remote_dir: remote_dir.to_string(),
            credentials: Arc::clone(&credentials),
        })
        .collect()
}

/// Resolves each job fully (retries and failover included) before starting
/// the next. `on_outcome` sees every outcome in submission order.
pub fn run_jobs<F>(
    scheduler: &FailoverScheduler<'_>,
    pool: &mut DestinationPool,
    jobs: &[Job],
    mut on_outcome: F,
) -> RunReport
where
    F: FnMut(&UploadOutcome),
{
    tracing::info!(
        target: AUDIT_TARGET,
        "Run started: {} jobs, {} endpoints, max_retries={}",
        jobs.len(),
        pool.len(),
        scheduler.executor().max_retries()
    );
    let mut aggregator = ResultAggregator::new();
    for job in jobs {
        let outcome = scheduler.dispatch(job, pool);
        on_outcome(&outcome);
        aggregator.record(outcome);
    }
    let report = aggregator.finish();
    tracing::info!(
        target: AUDIT_TARGET,
        "Run finished: {} succeeded, {} failed, {} files transferred",
        report.succeeded.len(),
        report.failed.len(),
        report.files_transferred
    );
    report
}
