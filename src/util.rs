use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Try to enable ANSI escape sequence support on Windows consoles.
/// Returns true if enabling succeeded.
#[cfg(windows)]
pub fn try_enable_ansi_on_windows() -> bool {
    enable_ansi_support::enable_ansi_support().is_ok()
}

// Elsewhere terminals handle ANSI already.
#[cfg(not(windows))]
pub fn try_enable_ansi_on_windows() -> bool {
    true
}

/// Job-level progress bar with a one-line header: Jobs, Retries, Backoff.
pub fn init_job_progress(
    jobs: u64,
    max_retries: u32,
    backoff_ms: u64,
) -> Result<ProgressBar, indicatif::style::TemplateError> {
    let style = ProgressStyle::with_template(
        "{prefix} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}",
    )?
    .progress_chars("=> ");
    let pb = ProgressBar::new(jobs);
    pb.set_style(style);
    pb.set_prefix(startup_header(max_retries, backoff_ms));
    Ok(pb)
}

fn startup_header(max_retries: u32, backoff_ms: u64) -> String {
    let retries = format!("Retries:{}", max_retries);
    let backoff = format!("Backoff:{}ms", backoff_ms);
    if try_enable_ansi_on_windows() {
        format!("{}  {}", retries.cyan(), backoff.yellow())
    } else {
        format!("{}  {}", retries, backoff)
    }
}
