//! Terminal display logic for the name-probe CLI.
//!
//! Colored result lines, the spinner shown while names are generated,
//! run headers and the closing summary table. Human-facing output goes
//! through the `console` crate; machine output (`--json`) lives in `main.rs`.

use console::{pad_str, style, Alignment, Term};
use name_probe_lib::{CheckResult, CheckStatus, RunSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner with the given message, or `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        let term = Term::stderr();
        if !term.is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a run.
pub fn print_header(name_count: usize, concurrency: usize, delay_secs: f64, proxies: usize) {
    println!(
        "{} {} {}",
        style("name-probe").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Checking {} name{}",
            name_count,
            if name_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );

    let mut meta_parts = vec![
        format!("Concurrency: {}", concurrency),
        format!("Delay: {:.1}s", delay_secs),
    ];
    if proxies > 0 {
        meta_parts.push(format!("Proxies: {}", proxies));
    }

    println!("{}", style(meta_parts.join(" | ")).dim());
    println!();
}

// ── Single result line ───────────────────────────────────────────────────────

/// Format and print a single result with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_result(result: &CheckResult, counter: Option<(usize, usize)>) {
    let name_width = 24;
    let padded_name = pad_str(&result.name, name_width, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    let status = match result.status {
        CheckStatus::Available => style("AVAILABLE").green().bold(),
        CheckStatus::Taken => style("TAKEN").red().bold(),
        CheckStatus::RateLimited => style("RATE LIMITED").yellow().bold(),
        CheckStatus::Error => style("ERROR").magenta(),
    };

    match brief_message(result) {
        Some(detail) => println!(
            "  {}{}  {}  {}",
            prefix,
            style(&padded_name).white(),
            status,
            style(detail).dim(),
        ),
        None => println!("  {}{}  {}", prefix, style(&padded_name).white(), status),
    }
}

/// Print generated or loaded candidates for `--dry-run`.
pub fn print_candidates(names: &[String], source: &str) {
    println!(
        "{} {}",
        style(format!("{} candidate{}", names.len(), if names.len() == 1 { "" } else { "s" }))
            .bold(),
        style(format!("({})", source)).dim(),
    );
    for name in names {
        println!("  {}", name);
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary table with per-status counts.
pub fn print_summary(summary: &RunSummary) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} name{} in {:.1}s{}",
        style(summary.received).bold(),
        if summary.received == 1 { "" } else { "s" },
        summary.duration.as_secs_f64(),
        if summary.is_complete() {
            String::new()
        } else {
            format!(
                "  {}",
                style(format!("({} of {} finished)", summary.received, summary.expected)).yellow()
            )
        },
    );

    for status in CheckStatus::ALL {
        let count = summary.tally.get(status);
        let label = pad_str(status.as_str(), 14, Alignment::Left, None);
        let value = format!("{:>5}", count);
        let line = match status {
            CheckStatus::Available => format!("{}{}", style(label).green(), style(value).green()),
            CheckStatus::Taken => format!("{}{}", style(label).red(), style(value).red()),
            CheckStatus::RateLimited => {
                format!("{}{}", style(label).yellow(), style(value).yellow())
            }
            CheckStatus::Error => format!("{}{}", style(label).magenta(), style(value).magenta()),
        };
        println!("    {}", line);
    }
}

/// Print where available names were saved.
pub fn print_saved(count: usize, path: &std::path::Path) {
    if count == 0 {
        println!("  {}", style("No available names found.").dim());
    } else {
        println!(
            "  {} Saved {} available name{} to {}",
            style("✓").green().bold(),
            count,
            if count == 1 { "" } else { "s" },
            style(path.display()).bold(),
        );
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Short detail for statuses that carry one worth showing.
fn brief_message(result: &CheckResult) -> Option<String> {
    match result.status {
        CheckStatus::Available | CheckStatus::Taken => None,
        CheckStatus::RateLimited | CheckStatus::Error => result
            .message
            .as_ref()
            .map(|m| format!("({})", truncate(m, 60))),
    }
}

fn truncate(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        message.to_string()
    } else {
        let cut: String = message.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brief_message_hidden_for_plain_outcomes() {
        assert_eq!(brief_message(&CheckResult::available("viper")), None);
        assert_eq!(brief_message(&CheckResult::taken("viper")), None);
    }

    #[test]
    fn test_brief_message_for_rate_limited() {
        let r = CheckResult::rate_limited("viper", 5.0);
        assert_eq!(
            brief_message(&r).as_deref(),
            Some("(Rate limited, pausing for 5s)")
        );
    }

    #[test]
    fn test_brief_message_truncates_long_errors() {
        let r = CheckResult::error("viper", "x".repeat(100));
        let msg = brief_message(&r).unwrap();
        assert_eq!(msg.chars().count(), 62);
        assert!(msg.ends_with("...)"));
    }

    #[test]
    fn test_truncate_short_message_unchanged() {
        assert_eq!(truncate("HTTP 500", 60), "HTTP 500");
    }
}
