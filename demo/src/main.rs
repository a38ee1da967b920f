//! Tensalis Client — Demo CLI
//!
//! Exercises every client operation against a live Tensalis endpoint.
//! Credentials come from `--config <file.toml>` or the `TENSALIS_*`
//! environment variables.
//!
//! Usage:
//!   cargo run -p demo -- verify --response "..." --context "..."
//!   cargo run -p demo -- stream --context "Returns are accepted within 30 days."
//!   cargo run -p demo -- batch --file items.json
//!   cargo run -p demo -- health
//!   cargo run -p demo -- usage

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use tensalis_client::{ClientConfig, TensalisClient};
use tensalis_contracts::{
    error::{TensalisError, TensalisResult},
    request::{BatchItem, Mode},
    stream::StreamUnit,
    verdict::Verdict,
};

/// A response that contradicts the default demo context on purpose.
const DEFAULT_STREAM_TEXT: &str = "The refund policy allows returns within 90 days. \
    Original receipt is required. Items must be unused.";

// ── CLI definition ────────────────────────────────────────────────────────────

/// Tensalis — hallucination detection client demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Tensalis hallucination-detection client demo",
    long_about = "Verifies LLM responses against source context using the Tensalis API,\n\
                  either in one shot, in batches, or while the response is streaming."
)]
struct Cli {
    /// TOML client config. Falls back to TENSALIS_* environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured strictness mode.
    #[arg(long, global = true, value_enum)]
    mode: Option<ModeArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Strict,
    Balanced,
    Permissive,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Strict => Mode::Strict,
            ModeArg::Balanced => Mode::Balanced,
            ModeArg::Permissive => Mode::Permissive,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Verify one response against its context.
    Verify {
        #[arg(long)]
        response: String,
        /// A source passage. Repeat for several passages.
        #[arg(long = "context", required = true)]
        context: Vec<String>,
        /// Metadata forwarded to the server, as a JSON object.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Stream a response word by word, verifying as it goes.
    Stream {
        /// A source passage. Repeat for several passages.
        #[arg(long = "context", required = true)]
        context: Vec<String>,
        /// Text the mock LLM streams.
        #[arg(long, default_value = DEFAULT_STREAM_TEXT)]
        text: String,
        /// Tokens between verification checks.
        #[arg(long, default_value_t = 25)]
        check_interval: usize,
        /// Keep streaming unverified text if a check fails at the transport level.
        #[arg(long)]
        fail_open: bool,
    },
    /// Verify every item of a JSON file: `[{"response": "...", "context": [...]}]`.
    Batch {
        #[arg(long)]
        file: PathBuf,
    },
    /// Check API health.
    Health,
    /// Show usage statistics for the configured API key.
    Usage,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_config(&cli)
        .and_then(TensalisClient::new)
        .and_then(|client| dispatch(&client, cli.command));

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> TensalisResult<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env()?,
    };
    Ok(match cli.mode {
        Some(mode) => config.with_mode(mode.into()),
        None => config,
    })
}

fn dispatch(client: &TensalisClient, command: Command) -> TensalisResult<()> {
    match command {
        Command::Verify {
            response,
            context,
            metadata,
        } => run_verify(client, &response, context, metadata.as_deref()),
        Command::Stream {
            context,
            text,
            check_interval,
            fail_open,
        } => run_stream(client, context, &text, check_interval, fail_open),
        Command::Batch { file } => run_batch(client, &file),
        Command::Health => print_json(&client.health()?),
        Command::Usage => print_json(&client.usage()?),
    }
}

// ── verify ────────────────────────────────────────────────────────────────────

fn run_verify(
    client: &TensalisClient,
    response: &str,
    context: Vec<String>,
    metadata: Option<&str>,
) -> TensalisResult<()> {
    let metadata = metadata
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(|e| TensalisError::validation("metadata", format!("not valid JSON: {e}")))?;

    let verdict = client.verify(response, context, metadata.as_ref())?;
    print_verdict(&verdict);
    Ok(())
}

// ── stream ────────────────────────────────────────────────────────────────────

/// Stands in for a streaming LLM: yields the text one word at a time.
fn mock_llm(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(|word| format!("{word} "))
}

enum StreamOutcome {
    Completed { unverified_tokens: usize },
    Blocked(Verdict),
    /// `unsent` is the text of the chunk whose check failed. The session
    /// pulled it but never yielded it.
    Failed { error: TensalisError, unsent: String },
}

fn run_stream(
    client: &TensalisClient,
    context: Vec<String>,
    text: &str,
    check_interval: usize,
    fail_open: bool,
) -> TensalisResult<()> {
    println!("Streaming with verification every {check_interval} tokens...");
    println!("--------------------------------------------------");

    // The source is lent to the session, so whatever the session did not
    // pull is still available if the caller decides to fail open.
    let mut chunks = mock_llm(text);
    let mut delivered = String::new();

    let outcome = {
        let mut stream = client.verify_stream(&mut chunks, context, check_interval)?;
        loop {
            match stream.next() {
                None => {
                    break StreamOutcome::Completed {
                        unverified_tokens: stream.unverified_tokens(),
                    }
                }
                Some(Ok(StreamUnit::Blocked { verdict })) => break StreamOutcome::Blocked(verdict),
                Some(Ok(unit)) => emit(&mut delivered, unit.text().unwrap_or_default()),
                Some(Err(error)) => {
                    let unsent = stream
                        .accumulated()
                        .get(delivered.len()..)
                        .unwrap_or_default()
                        .to_string();
                    break StreamOutcome::Failed { error, unsent };
                }
            }
        }
    };

    println!();
    println!("--------------------------------------------------");

    match outcome {
        StreamOutcome::Completed { unverified_tokens } => {
            println!("Stream completed.");
            if unverified_tokens > 0 {
                println!("Note: the last {unverified_tokens} token(s) were below the check interval and were not verified.");
            }
        }
        StreamOutcome::Blocked(verdict) => {
            println!("Hallucination detected!");
            print_verdict(&verdict);
            println!();
            println!("Delivered before block:");
            println!("{}", delivered.trim_end());
            println!("[Response truncated: verification failed]");
        }
        StreamOutcome::Failed { error, unsent } if fail_open => {
            warn!(error = %error, "verification unavailable, continuing unverified");
            println!("[verification unavailable: {error}; remaining text is unverified]");
            emit(&mut delivered, &unsent);
            for chunk in chunks {
                emit(&mut delivered, &chunk);
            }
            println!();
        }
        StreamOutcome::Failed { error, .. } => return Err(error),
    }

    Ok(())
}

fn emit(delivered: &mut String, text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
    delivered.push_str(text);
}

// ── batch ─────────────────────────────────────────────────────────────────────

fn run_batch(client: &TensalisClient, file: &Path) -> TensalisResult<()> {
    let contents = std::fs::read_to_string(file).map_err(|e| {
        TensalisError::validation("file", format!("cannot read '{}': {}", file.display(), e))
    })?;
    let items: Vec<BatchItem> = serde_json::from_str(&contents).map_err(|e| {
        TensalisError::validation("file", format!("'{}' is not a list of items: {}", file.display(), e))
    })?;

    let verdicts = client.verify_batch(&items)?;
    for (i, (item, verdict)) in items.iter().zip(&verdicts).enumerate() {
        println!("[{}] {}", i + 1, item.response);
        print_verdict(verdict);
        println!();
    }
    if verdicts.len() != items.len() {
        warn!(
            items = items.len(),
            results = verdicts.len(),
            "server returned a different number of results than items sent"
        );
    }
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_verdict(verdict: &Verdict) {
    println!("  Status:     {}", verdict.status());
    if let Some(severity) = verdict.severity() {
        println!("  Severity:   {severity}");
    }
    if let Some(reason) = verdict.reason() {
        println!("  Reason:     {reason}");
    }
    if let Some(confidence) = verdict.confidence() {
        println!("  Confidence: {confidence:.2}");
    }
    if let Some(layer) = verdict.layer() {
        println!("  Layer:      {layer}");
    }
    if let Some(latency) = verdict.latency_ms() {
        println!("  Latency:    {latency} ms");
    }
}

fn print_json(value: &serde_json::Value) -> TensalisResult<()> {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    println!("{pretty}");
    Ok(())
}
