use std::path::PathBuf;

use thiserror::Error;

use crate::server::Endpoint;

/// Transient failures raised while talking to one endpoint. Every variant is
/// retried against the same endpoint and, once retries run out, failed over.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("cannot resolve address: {0}")]
    NoAddress(String),
    #[error("tcp connect to {addr} failed: {msg}")]
    Connect { addr: String, msg: String },
    #[error("cannot create SSH session: {0}")]
    SessionCreateFailed(String),
    #[error("SSH handshake failed: {addr} — {msg}")]
    HandshakeFailed { addr: String, msg: String },
    #[error("SSH authentication failed: {addr} — {msg}")]
    AuthFailed { addr: String, msg: String },
    #[error("cannot open SFTP subsystem: {addr} — {msg}")]
    SftpCreateFailed { addr: String, msg: String },
    #[error("local read failed: {path} — {msg}")]
    LocalIo { path: String, msg: String },
    #[error("remote write failed: {path} — {msg}")]
    RemoteIo { path: String, msg: String },
}

impl TransferError {
    /// True when the failure happened before any file could be sent.
    pub fn is_connection_failure(&self) -> bool {
        use TransferError::*;
        matches!(
            self,
            NoAddress(_)
                | Connect { .. }
                | SessionCreateFailed(_)
                | HandshakeFailed { .. }
                | AuthFailed { .. }
                | SftpCreateFailed { .. }
        )
    }
}

/// Per-job failure that no retry or failover can fix.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("{} neither a file nor a directory or does not exist.", .0.display())]
    InvalidSource(PathBuf),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("destination pool is empty")]
    Empty,
    #[error("destination pool needs at least 2 endpoints, found {0}")]
    TooFewEndpoints(usize),
    #[error("endpoint {0} is listed more than once")]
    DuplicateEndpoint(Endpoint),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointParseError {
    #[error("host is empty in '{0}'")]
    EmptyHost(String),
    #[error("invalid port '{port}' in '{input}' (expected 1-65535)")]
    InvalidPort { input: String, port: String },
}

/// Fatal run-level errors. They abort before any job is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("private key not found: {}", .0.display())]
    MissingCredential(PathBuf),
    #[error("max_retries must be at least 1")]
    InvalidRetries,
    #[error("no source locations given")]
    NoSources,
    #[error("none of the given source locations is a file or a directory")]
    NoValidSources,
}
