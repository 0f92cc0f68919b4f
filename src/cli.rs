use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Send files to multiple sftp servers", long_about = None)]
pub struct Cli {
    #[clap(help = "Locations of files/folders to transfer")]
    pub locations: Vec<String>,
    #[clap(long, default_value = "sftpuser", help = "Username for sftp")]
    pub user: String,
    #[clap(
        long = "remote-dir",
        alias = "remote_dir",
        default_value = "/remote_directory/",
        help = "Remote directory to put the files"
    )]
    pub remote_dir: String,
    #[clap(short, long, default_value = crate::config::DEFAULT_CONFIG_PATH, help = "Path to the JSON config file")]
    pub config: PathBuf,
    #[clap(long, help = "Attempts per endpoint before failing over (overrides config)")]
    pub max_retries: Option<u32>,
    #[clap(long = "backoff-ms", help = "Base backoff in milliseconds (overrides config)")]
    pub backoff_ms: Option<u64>,
    #[clap(long, help = "Connect to every configured endpoint once and report reachability")]
    pub check: bool,
    #[clap(short, long, help = "Print debug diagnostics to stderr")]
    pub verbose: bool,
    #[clap(long, help = "Print a single JSON summary instead of the table")]
    pub json: bool,
    #[clap(short, long, help = "Only print the summary line")]
    pub quiet: bool,
}
