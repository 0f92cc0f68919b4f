use std::path::Path;
use std::time::Duration;

use crate::TransferError;
use crate::error::SourceError;
use crate::logging::{AUDIT_TARGET, MANIFEST_TARGET};
use crate::server::Endpoint;
use crate::transfer::Job;
use crate::transfer::backoff::{BackoffPolicy, RetryMachine, RetryState, Sleeper};
use crate::transfer::enumeration::{
    SourceKind, classify_source, colliding_basenames, list_files_recursive,
};
use crate::transfer::helpers::{display_path, flattened_remote_path};
use crate::transfer::session::{SessionGuard, TransferClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded { files: u64 },
    Failed,
}

/// One try of a job against one endpoint. Only lives for one executor call.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub endpoint: Endpoint,
    /// 1-based
    pub retry_index: u32,
    pub outcome: AttemptOutcome,
    pub error: Option<TransferError>,
    /// Wait served after this attempt, if another one follows.
    pub backoff: Option<Duration>,
}

/// Result of driving one job against one fixed endpoint.
#[derive(Debug, Clone)]
pub struct EndpointResult {
    pub success: bool,
    pub files_transferred: u64,
    pub attempts: Vec<Attempt>,
}

impl EndpointResult {
    pub fn last_error(&self) -> Option<&TransferError> {
        self.attempts.iter().rev().find_map(|a| a.error.as_ref())
    }
}

/// Uploads a whole job to a single endpoint, retrying the entire job from its
/// first file on any connect or put failure.
pub struct UploadExecutor<'a> {
    client: &'a dyn TransferClient,
    sleeper: &'a dyn Sleeper,
    policy: BackoffPolicy,
    max_retries: u32,
}

impl<'a> UploadExecutor<'a> {
    pub fn new(
        client: &'a dyn TransferClient,
        sleeper: &'a dyn Sleeper,
        policy: BackoffPolicy,
        max_retries: u32,
    ) -> Self {
        Self { client, sleeper, policy, max_retries: max_retries.max(1) }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Classifies the source once per job and flags basenames that would
    /// overwrite each other in the flat remote directory.
    pub fn preflight(&self, job: &Job) -> Result<SourceKind, SourceError> {
        let kind = classify_source(&job.source)?;
        if kind == SourceKind::Dir {
            let dups = colliding_basenames(&job.source);
            if !dups.is_empty() {
                tracing::warn!(
                    target: AUDIT_TARGET,
                    "{} contains files sharing a name ({}); later files overwrite earlier ones in {}",
                    display_path(&job.source),
                    dups.join(", "),
                    job.remote_dir
                );
            }
        }
        Ok(kind)
    }

    pub fn execute(&self, job: &Job, endpoint: &Endpoint) -> Result<EndpointResult, SourceError> {
        let kind = classify_source(&job.source).inspect_err(|e| {
            tracing::error!(target: AUDIT_TARGET, "{}", e);
            tracing::info!(target: MANIFEST_TARGET, "{}", e);
        })?;

        let mut machine = RetryMachine::new(self.policy, self.max_retries);
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut files_transferred = 0u64;
        loop {
            match machine.state() {
                RetryState::Attempting { attempt } => {
                    tracing::info!(
                        target: AUDIT_TARGET,
                        "Attempt {}/{}: uploading {} to server {}",
                        attempt,
                        self.max_retries,
                        display_path(&job.source),
                        endpoint
                    );
                    match self.attempt_once(job, kind, endpoint) {
                        Ok(files) => {
                            files_transferred = files;
                            machine.succeed();
                            attempts.push(Attempt {
                                endpoint: endpoint.clone(),
                                retry_index: attempt,
                                outcome: AttemptOutcome::Succeeded { files },
                                error: None,
                                backoff: None,
                            });
                        }
                        Err(e) => {
                            let backoff = match machine.fail() {
                                RetryState::BackoffWait { delay, .. } => Some(delay),
                                _ => None,
                            };
                            let next = match backoff {
                                Some(d) => format!("retrying in {} ms", d.as_millis()),
                                None => "no retries left".to_string(),
                            };
                            let msg = format!(
                                "Failed to transfer {} to {} (attempt {}/{}, {}). Error: {}",
                                display_path(&job.source),
                                endpoint,
                                attempt,
                                self.max_retries,
                                next,
                                e
                            );
                            tracing::error!(target: AUDIT_TARGET, "{}", msg);
                            tracing::info!(target: MANIFEST_TARGET, "{}", msg);
                            attempts.push(Attempt {
                                endpoint: endpoint.clone(),
                                retry_index: attempt,
                                outcome: AttemptOutcome::Failed,
                                error: Some(e),
                                backoff,
                            });
                        }
                    }
                }
                RetryState::BackoffWait { attempt, delay } => {
                    tracing::warn!(
                        target: AUDIT_TARGET,
                        "Retry {} of {} on {} after {} ms backoff",
                        attempt,
                        display_path(&job.source),
                        endpoint,
                        delay.as_millis()
                    );
                    self.sleeper.sleep(delay);
                    machine.resume();
                }
                RetryState::Succeeded { attempt } => {
                    tracing::info!(
                        target: AUDIT_TARGET,
                        "Upload of {} to {} succeeded on attempt {} ({} files)",
                        display_path(&job.source),
                        endpoint,
                        attempt,
                        files_transferred
                    );
                    return Ok(EndpointResult { success: true, files_transferred, attempts });
                }
                RetryState::Exhausted { attempts: n } => {
                    tracing::error!(
                        target: AUDIT_TARGET,
                        "Giving up on {} for {} after {} attempts",
                        endpoint,
                        display_path(&job.source),
                        n
                    );
                    // a failed attempt is redone from scratch, so nothing carries over
                    return Ok(EndpointResult { success: false, files_transferred: 0, attempts });
                }
            }
        }
    }

    fn attempt_once(
        &self,
        job: &Job,
        kind: SourceKind,
        endpoint: &Endpoint,
    ) -> Result<u64, TransferError> {
        let mut session = SessionGuard::new(self.client.connect(endpoint, &job.credentials)?);
        let mut sent = 0u64;
        match kind {
            SourceKind::File => {
                put_one(&mut session, &job.source, &job.remote_dir, endpoint)?;
                sent += 1;
            }
            SourceKind::Dir => {
                for local in list_files_recursive(&job.source) {
                    put_one(&mut session, &local?, &job.remote_dir, endpoint)?;
                    sent += 1;
                }
            }
        }
        drop(session);
        Ok(sent)
    }
}

fn put_one(
    session: &mut SessionGuard,
    local: &Path,
    remote_dir: &str,
    endpoint: &Endpoint,
) -> Result<(), TransferError> {
    let remote = flattened_remote_path(remote_dir, local);
    tracing::info!(target: MANIFEST_TARGET, "Starting to upload {} to server {}", display_path(local), endpoint);
    session.put_file(local, &remote)?;
    tracing::info!(target: MANIFEST_TARGET, "Upload of {} to {} successful.", display_path(local), endpoint);
    tracing::debug!("[executor] {} -> {}:{}", display_path(local), endpoint, remote);
    Ok(())
}
