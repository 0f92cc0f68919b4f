use crate::logging::{AUDIT_TARGET, MANIFEST_TARGET};
use crate::pool::DestinationPool;
use crate::report::UploadOutcome;
use crate::server::Endpoint;
use crate::transfer::Job;
use crate::transfer::executor::UploadExecutor;
use crate::transfer::helpers::display_path;

/// Tries a job on each endpoint of the pool, in rotation order, until one
/// accepts it. The pool turns by one for every endpoint actually tried, so
/// consecutive jobs start on different endpoints.
pub struct FailoverScheduler<'a> {
    executor: UploadExecutor<'a>,
}

impl<'a> FailoverScheduler<'a> {
    pub fn new(executor: UploadExecutor<'a>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &UploadExecutor<'a> {
        &self.executor
    }

    /// At most one lap of the pool per job. Retries happen only inside the
    /// executor, never as a second lap.
    pub fn dispatch(&self, job: &Job, pool: &mut DestinationPool) -> UploadOutcome {
        if let Err(e) = self.executor.preflight(job) {
            tracing::error!(target: AUDIT_TARGET, "{}", e);
            tracing::info!(target: MANIFEST_TARGET, "{}", e);
            return UploadOutcome::failed(job.source.clone(), Vec::new(), Some(e.to_string()));
        }

        let candidates: Vec<Endpoint> = pool.candidates().cloned().collect();
        let mut attempted: Vec<Endpoint> = Vec::with_capacity(candidates.len());
        let mut last_error: Option<String> = None;
        for endpoint in candidates {
            let result = match self.executor.execute(job, &endpoint) {
                Ok(r) => r,
                // source vanished mid-run: no network attempt, no rotation
                Err(e) => {
                    return UploadOutcome::failed(job.source.clone(), attempted, Some(e.to_string()));
                }
            };
            pool.rotate(1);
            attempted.push(endpoint.clone());
            if result.success {
                return UploadOutcome::succeeded(
                    job.source.clone(),
                    endpoint,
                    result.files_transferred,
                    attempted,
                );
            }
            last_error = result.last_error().map(|e| e.to_string());
            tracing::warn!(
                target: AUDIT_TARGET,
                "Endpoint {} exhausted for {}; failing over",
                endpoint,
                display_path(&job.source)
            );
        }

        tracing::error!(
            target: AUDIT_TARGET,
            "All {} endpoints failed for {}",
            attempted.len(),
            display_path(&job.source)
        );
        tracing::info!(
            target: MANIFEST_TARGET,
            "Upload of {} failed on every server.",
            display_path(&job.source)
        );
        UploadOutcome::failed(job.source.clone(), attempted, last_error)
    }
}
