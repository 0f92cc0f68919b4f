//! Audit log, upload manifest and console diagnostics.
//!
//! Events with target `audit` go to `<log_dir>/sftp_transfers.log`, events
//! with target `manifest` to `<log_dir>/upload_manifest.log`. Both files are
//! appended to. Everything else is console diagnostics on stderr, controlled
//! by `RUST_LOG` or `--verbose`.

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::{AUDIT_LOG_NAME, MANIFEST_LOG_NAME};

pub const AUDIT_TARGET: &str = "audit";
pub const MANIFEST_TARGET: &str = "manifest";

/// Keeps the background writers alive; drop it only at the end of `main`.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

pub fn init(log_dir: &Path, verbose: bool) -> anyhow::Result<LogGuards> {
    std::fs::create_dir_all(log_dir)?;

    let (audit_writer, audit_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, AUDIT_LOG_NAME));
    let (manifest_writer, manifest_guard) = tracing_appender::non_blocking(
        tracing_appender::rolling::never(log_dir, MANIFEST_LOG_NAME),
    );

    let audit_layer = fmt::layer()
        .with_writer(audit_writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(Targets::new().with_target(AUDIT_TARGET, Level::INFO));
    let manifest_layer = fmt::layer()
        .with_writer(manifest_writer)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_filter(Targets::new().with_target(MANIFEST_TARGET, Level::INFO));

    let default_directive =
        if verbose { "sftp_relay=debug,srelay=debug" } else { "sftp_relay=warn,srelay=warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(audit_layer)
        .with(manifest_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LogGuards { _guards: vec![audit_guard, manifest_guard] })
}
