//! datasight - ask an LLM analyst questions about a CSV dataset

mod chart;
mod commands;
mod config;
mod render;
mod samples;
mod transcript;
mod utils;

#[cfg(test)]
mod test_support;

use anyhow::Context as _;
use clap::Parser;
use datasight_agent::{Analyst, Dataset, Insight, Session, SessionLimits};
use datasight_ai::models::{DEFAULT_MODEL_ID, get_all_models, get_model_by_id, resolve_model};
use datasight_ai::providers::anthropic::AnthropicProvider;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// datasight - LLM-assisted insights for tabular data
#[derive(Parser, Debug)]
#[command(name = "datasight")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to analyze (header row required)
    #[arg(required_unless_present_any = ["init_config", "sample"])]
    csv: Option<PathBuf>,

    /// Analyze a bundled sample dataset instead of a CSV file
    #[arg(long, value_enum, conflicts_with = "csv")]
    sample: Option<samples::Sample>,

    /// Model to use (default: claude-sonnet-4-20250514)
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum follow-up exchanges per conversation
    #[arg(long)]
    max_turns: Option<usize>,

    /// Maximum tokens spent on follow-ups per conversation
    #[arg(long, conflicts_with = "no_token_cap")]
    max_session_tokens: Option<u64>,

    /// Disable the token cap (turn limit still applies)
    #[arg(long)]
    no_token_cap: bool,

    /// CSV field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Run the initial dataset analysis before anything else
    #[arg(short, long)]
    analyze: bool,

    /// Ask a single question non-interactively
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Write chart_<n>.py scripts for generated code into this directory
    #[arg(long)]
    chart_dir: Option<PathBuf>,

    /// Python interpreter used to render chart scripts to PNG
    #[arg(long)]
    python: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("datasight=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Config limits with CLI overrides applied
fn session_limits(args: &Args, cfg: &config::Config) -> SessionLimits {
    let mut limits: SessionLimits = cfg.limits.into();

    if let Some(turns) = args.max_turns {
        limits.max_turns = turns;
        limits.warn_turns = turns * 4 / 5;
    }
    if let Some(tokens) = args.max_session_tokens {
        limits.max_tokens = Some(tokens);
        limits.warn_tokens = Some(tokens * 4 / 5);
    }
    if args.no_token_cap {
        limits.max_tokens = None;
        limits.warn_tokens = None;
    }
    limits
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    dotenv::dotenv().ok();
    let cfg = config::Config::load();

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    let delimiter = args.delimiter as u8;

    let (dataset, dataset_name, script_data) = match (args.sample, args.csv.clone()) {
        (Some(sample), _) => (
            sample
                .load()
                .with_context(|| format!("failed to load sample '{}'", sample.name()))?,
            format!("{} (sample)", sample.name()),
            chart::ScriptData::Sample(sample),
        ),
        (None, Some(path)) => (
            Dataset::from_csv_path(&path, delimiter)
                .with_context(|| format!("failed to load {}", path.display()))?,
            utils::display_name(&path),
            chart::ScriptData::File { path, delimiter },
        ),
        (None, None) => anyhow::bail!("a CSV file or --sample is required"),
    };
    tracing::info!(
        "Loaded {}: {} rows, {} columns",
        dataset_name,
        dataset.n_rows(),
        dataset.n_cols()
    );

    let model_id = args
        .model
        .clone()
        .or(cfg.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
    if get_model_by_id(&model_id).is_none() {
        let known: Vec<String> = get_all_models().into_iter().map(|m| m.id).collect();
        tracing::warn!("Unknown model '{}', known models: {}", model_id, known.join(", "));
    }
    let model = resolve_model(&model_id, cfg.base_url.as_deref());

    let Some(api_key) = cfg.api_key() else {
        eprintln!("Error: No API key found for Anthropic");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  1. Set API key: export ANTHROPIC_API_KEY=your-key");
        eprintln!("  2. Put ANTHROPIC_API_KEY=your-key in a .env file");
        eprintln!("  3. Add to config: datasight --init-config");
        std::process::exit(1);
    };

    let provider = Arc::new(AnthropicProvider::with_timeout(
        api_key,
        Duration::from_secs(cfg.request_timeout_secs),
    )?);
    let analyst = Analyst::new(provider, model, cfg.analyst_config());
    let mut session = Session::new(Arc::new(dataset), analyst, session_limits(&args, &cfg));

    let python = args.python.clone().or(cfg.python.clone());
    let mut charts = args
        .chart_dir
        .clone()
        .map(|dir| chart::ChartWriter::new(dir, script_data, python));

    if args.analyze {
        run_analyze(&mut session, &mut charts).await;
    }

    if let Some(question) = args.command.as_deref() {
        return run_command(&mut session, &mut charts, question).await;
    }

    run_interactive(&mut session, &mut charts, &dataset_name).await
}

fn thinking() {
    if io::stderr().is_terminal() {
        eprintln!("[Thinking...]");
    }
}

async fn present(insight: &Insight, charts: &mut Option<chart::ChartWriter>) {
    println!("{}", render::render_insight(insight));

    if insight.is_error() {
        return;
    }
    let (Some(code), Some(writer)) = (insight.generated_code.as_deref(), charts.as_mut()) else {
        return;
    };

    match writer.write(code).await {
        Ok(out) => {
            println!("[Chart script: {}]", out.script.display());
            if let Some(image) = out.image {
                println!("[Chart image: {}]", image.display());
            }
            if let Some(err) = out.render_error {
                println!("[Chart rendering failed: {}]", err);
            }
        }
        Err(e) => eprintln!("Failed to write chart script: {}", e),
    }
}

async fn run_analyze(session: &mut Session, charts: &mut Option<chart::ChartWriter>) {
    thinking();
    let insight = session.analyze().await;
    println!();
    present(&insight, charts).await;
    println!();
}

async fn ask(
    session: &mut Session,
    charts: &mut Option<chart::ChartWriter>,
    question: &str,
) -> anyhow::Result<()> {
    thinking();
    match session.ask(question).await {
        Ok(insight) => {
            println!();
            present(&insight, charts).await;
            Ok(())
        }
        Err(datasight_agent::Error::LimitExceeded { .. }) => {
            if let Some(notice) = render::limit_notice(session) {
                println!("{}", notice);
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_command(
    session: &mut Session,
    charts: &mut Option<chart::ChartWriter>,
    question: &str,
) -> anyhow::Result<()> {
    println!("datasight> {}", question);
    ask(session, charts, question).await?;
    println!("\n[{}]", render::status_line(session));
    Ok(())
}

async fn run_interactive(
    session: &mut Session,
    charts: &mut Option<chart::ChartWriter>,
    dataset_name: &str,
) -> anyhow::Result<()> {
    // Show minimal startup info (only if TTY)
    if io::stderr().is_terminal() {
        let dataset = session.dataset();
        eprintln!(
            "datasight ({}) {}: {} rows, {} columns",
            session.analyst().model().id,
            dataset_name,
            dataset.n_rows(),
            dataset.n_cols()
        );
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        println!("[{}]", render::status_line(session));
        if let Some(notice) = render::limit_notice(session) {
            println!("{}", notice);
        }
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(result) = commands::execute_command(input, session) {
            match result {
                commands::CommandResult::Clear => {
                    session.reset();
                    println!("Cleared conversation.");
                }
                commands::CommandResult::Analyze => {
                    run_analyze(session, charts).await;
                }
                commands::CommandResult::Export(path) => {
                    match transcript::export(&path, session, dataset_name) {
                        Ok(id) => println!("Exported conversation {} to {}", id, path.display()),
                        Err(e) => eprintln!("Export failed: {}", e),
                    }
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                }
                commands::CommandResult::Exit => {
                    break;
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        if let Err(e) = ask(session, charts, input).await {
            eprintln!("Error: {}", e);
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["datasight", "data.csv"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_default_limits() {
        let limits = session_limits(&args(&[]), &config::Config::default());
        assert_eq!(limits, SessionLimits::default());
    }

    #[test]
    fn test_limit_overrides() {
        let limits = session_limits(
            &args(&["--max-turns", "20", "--no-token-cap"]),
            &config::Config::default(),
        );
        assert_eq!(limits.max_turns, 20);
        assert_eq!(limits.warn_turns, 16);
        assert_eq!(limits.max_tokens, None);
        assert_eq!(limits.warn_tokens, None);

        let limits = session_limits(&args(&["--max-session-tokens", "10000"]), &config::Config::default());
        assert_eq!(limits.max_tokens, Some(10_000));
        assert_eq!(limits.warn_tokens, Some(8_000));
    }

    #[test]
    fn test_token_flags_conflict() {
        let result = Args::try_parse_from([
            "datasight",
            "data.csv",
            "--max-session-tokens",
            "100",
            "--no-token-cap",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_required_unless_init_config() {
        assert!(Args::try_parse_from(["datasight"]).is_err());
        assert!(Args::try_parse_from(["datasight", "--init-config"]).is_ok());
    }

    #[test]
    fn test_sample_replaces_csv() {
        let args = Args::try_parse_from(["datasight", "--sample", "iris"]).unwrap();
        assert_eq!(args.sample, Some(samples::Sample::Iris));
        assert!(args.csv.is_none());
        assert!(Args::try_parse_from(["datasight", "data.csv", "--sample", "iris"]).is_err());
        assert!(Args::try_parse_from(["datasight", "--sample", "titanic"]).is_err());
    }

    #[test]
    fn test_delimiter_flag() {
        assert_eq!(args(&[]).delimiter, ',');
        assert_eq!(args(&["--delimiter", ";"]).delimiter, ';');
    }
}
