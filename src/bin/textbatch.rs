use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde_json::json;
use textbatch::batch::batch_to_text;
use textbatch::{DataLoader, LoaderConfig, Vocab};

const PREVIEW_TOKENS: usize = 10;

#[derive(Parser, Debug)]
#[command(author, version, about = "Text corpus batching toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a vocabulary from a counts file and report its shape
    Vocab(VocabArgs),
    /// Stream batches from a corpus and report their shapes
    Stream(StreamArgs),
    /// Stream batches and print their rows back as text
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct VocabOptions {
    /// Token-counts file (one `<token> <count>` per line)
    #[arg(short = 'c', long = "counts", value_name = "PATH")]
    counts: PathBuf,

    /// Minimum occurrence count for inclusion
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    min_count: i64,

    /// Reserve additional special tokens (repeat flag)
    #[arg(long = "special-token", value_name = "TOKEN")]
    special_tokens: Vec<String>,
}

#[derive(Args, Debug)]
struct VocabArgs {
    #[command(flatten)]
    vocab: VocabOptions,

    /// Emit machine-readable JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct StreamOptions {
    /// Corpus file, one whitespace-tokenized sentence per line
    corpus: PathBuf,

    #[command(flatten)]
    vocab: VocabOptions,

    /// Sentences per batch
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Bytes of lines read per streaming pass
    #[arg(long, value_name = "BYTES")]
    chunk_bytes: Option<usize>,

    /// Truncate sentences to this many tokens
    #[arg(long, value_name = "N")]
    max_len: Option<usize>,

    /// Seed the shuffle RNG for reproducible output
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Number of batches to pull before stopping
    #[arg(long, value_name = "N", default_value_t = 8)]
    batches: usize,
}

#[derive(Args, Debug)]
struct StreamArgs {
    #[command(flatten)]
    stream: StreamOptions,

    /// Emit machine-readable JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    stream: StreamOptions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.command {
        Commands::Vocab(args) => cmd_vocab(&args),
        Commands::Stream(args) => cmd_stream(&args),
        Commands::Check(args) => cmd_check(&args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-1 => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn build_vocab(opts: &VocabOptions) -> Result<Vocab> {
    Vocab::from_counts_file(&opts.counts, opts.min_count, &opts.special_tokens)
        .with_context(|| format!("building vocabulary from {}", opts.counts.display()))
}

fn build_loader(opts: &StreamOptions) -> Result<DataLoader> {
    let vocab = Arc::new(build_vocab(&opts.vocab)?);
    let mut builder = LoaderConfig::builder()
        .max_len(opts.max_len)
        .seed(opts.seed);
    if let Some(batch_size) = opts.batch_size {
        builder = builder.batch_size(batch_size);
    }
    if let Some(chunk_bytes) = opts.chunk_bytes {
        builder = builder.chunk_bytes(chunk_bytes);
    }
    let cfg = builder.build().context("invalid loader configuration")?;
    DataLoader::new(vocab, &opts.corpus, cfg)
        .with_context(|| format!("opening corpus {}", opts.corpus.display()))
}

fn cmd_vocab(args: &VocabArgs) -> Result<()> {
    let vocab = build_vocab(&args.vocab)?;
    let preview: Vec<&str> = (0..vocab.size().min(PREVIEW_TOKENS))
        .map(|idx| vocab.token_at(idx))
        .collect();
    if args.json {
        let payload = json!({
            "size": vocab.size(),
            "padding_idx": vocab.padding_idx(),
            "unk_idx": vocab.unk_idx(),
            "bos_idx": vocab.bos_idx(),
            "eos_idx": vocab.eos_idx(),
            "head": preview,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Vocab size: {}", vocab.size());
        println!("Padding idx: {}", vocab.padding_idx());
        println!("Unknown idx: {}", vocab.unk_idx());
        println!("First tokens: {}", preview.join(" "));
    }
    Ok(())
}

fn cmd_stream(args: &StreamArgs) -> Result<()> {
    let mut loader = build_loader(&args.stream)?;
    let mut reports = Vec::with_capacity(args.stream.batches);
    for step in 0..args.stream.batches {
        let batch = loader
            .next_batch()
            .with_context(|| format!("streaming batch {step}"))?;
        info!(
            "batch {step}: {} steps x {} sentences (epoch {})",
            batch.steps(),
            batch.width(),
            loader.epoch()
        );
        reports.push((step, batch.steps(), batch.width(), loader.epoch()));
    }
    if args.json {
        let payload: Vec<_> = reports
            .iter()
            .map(|(step, steps, width, epoch)| {
                json!({
                    "step": step,
                    "steps": steps,
                    "width": width,
                    "epoch": epoch,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for (step, steps, width, epoch) in &reports {
            println!("batch {step}: shape ({steps}, {width}), epoch {epoch}");
        }
    }
    Ok(())
}

fn cmd_check(args: &CheckArgs) -> Result<()> {
    let mut loader = build_loader(&args.stream)?;
    for step in 0..args.stream.batches {
        let batch = loader
            .next_batch()
            .with_context(|| format!("streaming batch {step}"))?;
        for row in batch_to_text(&batch, loader.vocab()) {
            println!("{row}");
        }
    }
    Ok(())
}
