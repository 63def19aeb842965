//! Name Probe CLI Application
//!
//! A command-line interface for checking username availability against a
//! rate-limited endpoint. This CLI is a thin layer over name-probe-lib:
//! it resolves configuration, gathers candidates, streams results and saves
//! the available names.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::builder::PossibleValuesParser;
use clap::Parser;
use name_probe_lib::config::{load_proxy_file, parse_timeout_string};
use name_probe_lib::generate::{
    DictionaryGenerator, LeetGenerator, PatternGenerator, RandomCharGenerator,
    RemoteListGenerator, DEFAULT_PATTERN, DEFAULT_RANDOM_LENGTH,
};
use name_probe_lib::protocols::http::normalize_proxy_url;
use name_probe_lib::utils::read_candidates_from_file;
use name_probe_lib::{
    append_available, dedupe_preserving_order, load_env_config, normalize_candidate,
    validate_candidate, ConfigManager, EnvConfig, FileConfig, GenerationConfig, NameChecker,
    NameGenerator, ProbeConfig, ProbeError, RateLimitPolicy, ResultAggregator, MAX_CONCURRENCY,
    MAX_DELAY_SECS, MIN_CONCURRENCY,
};
use std::process;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// How many rejected input lines are listed before summarizing the rest
const MAX_INVALID_SHOWN: usize = 5;

/// CLI arguments for name-probe
#[derive(Parser, Debug)]
#[command(name = "name-probe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check username availability with adaptive rate limiting")]
#[command(
    long_about = "Check username availability against a rate-limited endpoint.\n\nGenerates or loads candidate names, probes them with bounded concurrency, backs off when throttled, and saves available names to a file."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Names to check
    #[arg(value_name = "NAMES", help_heading = "Input")]
    pub names: Vec<String>,

    /// Input file with names (one per line)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Input"
    )]
    pub file: Option<String>,

    /// Generate candidates with a strategy
    #[arg(
        short = 'g',
        long = "generate",
        value_name = "STRATEGY",
        value_parser = PossibleValuesParser::new(NameGenerator::STRATEGIES),
        help_heading = "Generation"
    )]
    pub generate: Option<String>,

    /// Number of names to generate
    #[arg(
        short = 'n',
        long = "count",
        default_value_t = 10,
        help_heading = "Generation"
    )]
    pub count: usize,

    /// Length of random names (default: 4)
    #[arg(long = "length", value_name = "N", help_heading = "Generation")]
    pub length: Option<usize>,

    /// Template for pattern names; {random} is replaced (default: user_{random})
    #[arg(long = "pattern", value_name = "TEMPLATE", help_heading = "Generation")]
    pub pattern: Option<String>,

    /// Append a number to dictionary names
    #[arg(long = "numbers", help_heading = "Generation")]
    pub numbers: bool,

    /// Base word for leet variants
    #[arg(long = "base-word", value_name = "WORD", help_heading = "Generation")]
    pub base_word: Option<String>,

    /// URL of a remote wordlist
    #[arg(long = "wordlist-url", value_name = "URL", help_heading = "Generation")]
    pub wordlist_url: Option<String>,

    /// Max concurrent probes (default: 5, max: 50)
    #[arg(short = 'c', long = "concurrency", help_heading = "Probing")]
    pub concurrency: Option<usize>,

    /// Initial delay between requests in seconds (default: 2.0)
    #[arg(long = "delay", value_name = "SECS", help_heading = "Probing")]
    pub delay: Option<f64>,

    /// Request timeout, e.g. "10s" or "1m"
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Probing")]
    pub timeout: Option<String>,

    /// Authorization token
    #[arg(long = "token", value_name = "TOKEN", help_heading = "Probing")]
    pub token: Option<String>,

    /// Availability endpoint URL
    #[arg(long = "endpoint", value_name = "URL", help_heading = "Probing")]
    pub endpoint: Option<String>,

    /// Webhook to notify for each available name
    #[arg(long = "webhook", value_name = "URL", help_heading = "Probing")]
    pub webhook: Option<String>,

    /// Proxy list file (one proxy per line)
    #[arg(long = "proxies", value_name = "FILE", help_heading = "Probing")]
    pub proxies: Option<String>,

    /// Re-probe rate limited names up to N times instead of recording them
    #[arg(long = "retry-rate-limited", value_name = "N", help_heading = "Probing")]
    pub retry_rate_limited: Option<u32>,

    /// File that available names are appended to (default: valid_usernames.txt)
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Output")]
    pub output: Option<String>,

    /// Output one JSON object per result, then a summary
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Print candidates without checking them
    #[arg(long = "dry-run", help_heading = "Output")]
    pub dry_run: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Write a starter config file and exit
    #[arg(long = "init-config", value_name = "FILE", help_heading = "Configuration")]
    pub init_config: Option<String>,

    /// Show debug logging
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything a run needs after configuration sources are merged.
#[derive(Debug)]
struct RunSettings {
    probe: ProbeConfig,
    generation: GenerationConfig,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Some(path) = &args.init_config {
        match ConfigManager::new(args.verbose).save_file(path, &ConfigManager::template()) {
            Ok(()) => {
                println!("Wrote starter configuration to {}", path);
                return;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }

    info!(
        "name-probe v{} starting (library v{})",
        env!("CARGO_PKG_VERSION"),
        name_probe_lib::VERSION
    );

    if let Err(e) = run_probe(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless -v or -d is given.
fn init_tracing(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // --init-config is self-contained
    if args.init_config.is_some() {
        return Ok(());
    }

    if args.names.is_empty() && args.file.is_none() && args.generate.is_none() {
        return Err(
            "You must specify names, a file with --file, or a strategy with --generate"
                .to_string(),
        );
    }

    if args.generate.is_some() && args.count == 0 {
        return Err("--count must be at least 1".to_string());
    }

    if args.length == Some(0) {
        return Err("--length must be at least 1".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(format!(
                "Concurrency must be between {} and {}",
                MIN_CONCURRENCY, MAX_CONCURRENCY
            ));
        }
    }

    if let Some(delay) = args.delay {
        if !delay.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&delay) {
            return Err(format!(
                "--delay must be between 0 and {} seconds",
                MAX_DELAY_SECS
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    if let Some(url) = &args.webhook {
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("--webhook must start with http:// or https://".to_string());
        }
    }

    Ok(())
}

/// Main probing logic
async fn run_probe(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_config(&args)?;
    let names = gather_candidates(&args, &settings).await?;

    if args.dry_run {
        if args.json {
            println!("{}", serde_json::to_string(&names)?);
        } else {
            ui::print_candidates(&names, "dry run");
        }
        return Ok(());
    }

    if !settings.probe.has_usable_token() {
        return Err(ProbeError::config(
            "No usable token. Set --token, NP_TOKEN, or [defaults].token in a config file",
        )
        .into());
    }

    let proxies = settings.probe.proxies.len();
    let checker = NameChecker::with_config(settings.probe)?;
    let output_path = checker.config().output_path.clone();

    // Ctrl-C cancels the run; partial results are still summarized and saved.
    let interrupt = {
        let checker = checker.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling remaining probes");
                checker.cancel();
            }
        })
    };

    if !args.json {
        ui::print_header(
            names.len(),
            checker.config().concurrency,
            checker.config().initial_delay_secs,
            proxies,
        );
    }

    let mut run = checker.check_names_stream(names);
    let mut aggregator = ResultAggregator::new(run.expected());
    let json = args.json;
    aggregator
        .drain(&mut run, |result, completed, total| {
            if json {
                match serde_json::to_string(result) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!(error = %e, "Failed to encode result"),
                }
            } else {
                ui::print_result(result, Some((completed, total)));
            }
        })
        .await;
    interrupt.abort();

    let summary = aggregator.finish();
    let saved = append_available(&output_path, &summary.available)?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "summary": summary,
                "saved": saved,
                "output": output_path.display().to_string(),
                "cancelled": checker.is_cancelled(),
            })
        );
    } else {
        println!();
        ui::print_summary(&summary);
        ui::print_saved(saved, &output_path);
        if checker.is_cancelled() {
            eprintln!("Run cancelled before all names were checked.");
        }
    }

    Ok(())
}

/// Build the run configuration with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (NP_*)
/// 3. Config file (explicit --config / NP_CONFIG, or discovered files)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<RunSettings, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config();

    let file_config = if let Some(path) = args.config.as_ref().or(env_config.config.as_ref()) {
        info!(path = %path, "Using explicit config file");
        config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
    } else {
        match config_manager.discover_and_load() {
            Ok(file_config) => file_config,
            Err(e) => {
                warn!(error = %e, "Config discovery failed, using defaults");
                FileConfig::default()
            }
        }
    };

    let mut probe = ProbeConfig::default();
    probe = apply_file_config(probe, &file_config);
    probe = apply_env_config(probe, &env_config);
    probe = apply_cli_args(probe, args);

    let proxy_file = args
        .proxies
        .clone()
        .or_else(|| env_config.proxy_file.clone())
        .or_else(|| file_config.proxies.as_ref().and_then(|p| p.file.clone()));
    let mut proxies: Vec<String> = file_config
        .proxies
        .as_ref()
        .and_then(|p| p.list.as_ref())
        .map(|list| list.iter().map(|p| normalize_proxy_url(p)).collect())
        .unwrap_or_default();
    if let Some(path) = proxy_file {
        proxies.extend(load_proxy_file(path)?);
    }
    probe = probe.with_proxies(dedupe_preserving_order(proxies));

    probe.validate()?;

    Ok(RunSettings {
        probe,
        generation: file_config.generation.unwrap_or_default(),
    })
}

/// Merge FileConfig into ProbeConfig
fn apply_file_config(mut config: ProbeConfig, file_config: &FileConfig) -> ProbeConfig {
    if let Some(defaults) = &file_config.defaults {
        if let Some(token) = &defaults.token {
            config = config.with_token(token.clone());
        }
        if let Some(endpoint) = &defaults.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(concurrency) = defaults.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(delay) = defaults.retry_delay {
            config = config.with_initial_delay(delay);
        }
        if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = defaults.rate_limit_retries {
            config = config.with_rate_limit_policy(RateLimitPolicy::from_retries(retries));
        }
        if let Some(output) = &defaults.output_file {
            config = config.with_output_path(output);
        }
    }

    if let Some(url) = file_config
        .notification
        .as_ref()
        .and_then(|n| n.webhook_url.as_ref())
    {
        config = config.with_webhook_url(url.clone());
    }

    config
}

/// Apply NP_* environment variables on top of file settings.
fn apply_env_config(mut config: ProbeConfig, env_config: &EnvConfig) -> ProbeConfig {
    if let Some(token) = &env_config.token {
        config = config.with_token(token.clone());
    }
    if let Some(endpoint) = &env_config.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Some(concurrency) = env_config.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(delay) = env_config.retry_delay {
        config = config.with_initial_delay(delay);
    }
    if let Some(secs) = env_config.timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    if let Some(url) = &env_config.webhook_url {
        config = config.with_webhook_url(url.clone());
    }
    if let Some(retries) = env_config.rate_limit_retries {
        config = config.with_rate_limit_policy(RateLimitPolicy::from_retries(retries));
    }
    if let Some(output) = &env_config.output {
        config = config.with_output_path(output);
    }
    config
}

/// Apply CLI arguments to config (highest precedence).
///
/// Only flags the user actually passed override earlier sources.
fn apply_cli_args(mut config: ProbeConfig, args: &Args) -> ProbeConfig {
    if let Some(token) = &args.token {
        config = config.with_token(token.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(delay) = args.delay {
        config = config.with_initial_delay(delay);
    }
    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    if let Some(url) = &args.webhook {
        config = config.with_webhook_url(url.clone());
    }
    if let Some(retries) = args.retry_rate_limited {
        config = config.with_rate_limit_policy(RateLimitPolicy::from_retries(retries));
    }
    if let Some(output) = &args.output {
        config = config.with_output_path(output);
    }
    config
}

/// Pick the generation strategy from CLI flags, falling back to config.
fn build_generator(
    args: &Args,
    generation: &GenerationConfig,
) -> Result<Option<NameGenerator>, String> {
    let Some(strategy) = args.generate.as_deref() else {
        return Ok(None);
    };

    let generator: NameGenerator = match strategy {
        "random" => {
            let length = args
                .length
                .or(generation.length)
                .unwrap_or(DEFAULT_RANDOM_LENGTH);
            RandomCharGenerator::new(length).into()
        }
        "pattern" => {
            let template = args
                .pattern
                .clone()
                .or_else(|| generation.pattern.clone())
                .unwrap_or_else(|| DEFAULT_PATTERN.to_string());
            PatternGenerator::new(template).into()
        }
        "dictionary" => {
            let add_numbers = args.numbers || generation.add_numbers.unwrap_or(false);
            DictionaryGenerator::new(add_numbers).into()
        }
        "leet" => {
            let base_word = args
                .base_word
                .clone()
                .or_else(|| generation.base_word.clone())
                .filter(|w| !w.trim().is_empty())
                .ok_or("--generate leet requires --base-word")?;
            LeetGenerator::new(base_word.trim()).into()
        }
        "remote" => {
            let url = args
                .wordlist_url
                .clone()
                .or_else(|| generation.wordlist_url.clone())
                .filter(|u| !u.trim().is_empty())
                .ok_or("--generate remote requires --wordlist-url")?;
            RemoteListGenerator::new(url).into()
        }
        other => return Err(format!("Unknown generation strategy '{}'", other)),
    };

    Ok(Some(generator))
}

/// Collect candidates from arguments, the input file and the generator.
///
/// Order is preserved and duplicates are dropped.
async fn gather_candidates(
    args: &Args,
    settings: &RunSettings,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut names = Vec::new();

    for raw in &args.names {
        let name = normalize_candidate(raw);
        match validate_candidate(&name) {
            Ok(()) => names.push(name),
            Err(e) => eprintln!("Skipping '{}': {}", raw, e),
        }
    }

    if let Some(path) = &args.file {
        let list = read_candidates_from_file(path)?;
        report_invalid_lines(&list.invalid);
        names.extend(list.names);
    }

    if let Some(generator) = build_generator(args, &settings.generation)? {
        let spinner = if args.json {
            None
        } else {
            ui::Spinner::start(format!("Generating {} names ({})...", args.count, generator.name()))
        };

        let result = generator.generate(args.count).await;

        // A short result is already logged by the generator.
        if let Some(s) = spinner {
            s.stop().await;
        }
        names.extend(result.names);
    }

    let names = dedupe_preserving_order(names);
    if names.is_empty() {
        return Err("No valid names to check".into());
    }

    Ok(names)
}

fn report_invalid_lines(invalid: &[String]) {
    if invalid.is_empty() {
        return;
    }

    eprintln!("Found {} invalid entries in the file:", invalid.len());
    for line in &invalid[..invalid.len().min(MAX_INVALID_SHOWN)] {
        eprintln!("  {}", line);
    }
    if invalid.len() > MAX_INVALID_SHOWN {
        eprintln!(
            "  ... and {} more invalid entries",
            invalid.len() - MAX_INVALID_SHOWN
        );
    }
    eprintln!();
}
