pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod parse;
pub mod pool;
pub mod report;
pub mod server;
pub mod transfer;
pub mod util;

pub use error::{ConfigError, PoolError, SourceError, TransferError};
pub use pool::DestinationPool;
pub use report::{ResultAggregator, RunReport, UploadOutcome};
pub use server::Endpoint;
