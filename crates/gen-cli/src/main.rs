use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

use gen_core::{EagerStep, GenerateOptions, Generator, TimedStep};
use gen_model::llama::LlamaModel;
use gen_model::{ByteTokenizer, LanguageModel, Tokenizer};
use gen_sampler::{SamplingParams, Selector};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sample continuations of a prompt", long_about = None)]
struct Args {
    /// The prompt to continue.
    #[arg(long, default_value = "Hello, my name is")]
    prompt: String,

    /// Replace the prompt with this many random token ids.
    #[arg(long)]
    prompt_synthetic: Option<usize>,

    /// Number of samples to generate.
    #[arg(long, default_value_t = 3)]
    num_samples: usize,

    /// Number of tokens to generate per sample.
    #[arg(short = 'n', long, default_value_t = 50)]
    max_new_tokens: usize,

    /// Sample only among the k most likely tokens; 0 disables truncation.
    #[arg(long, default_value_t = 200)]
    top_k: usize,

    /// Divides logits before sampling; higher is more random.
    #[arg(long, default_value_t = 0.8)]
    temperature: f32,

    /// Always take the most likely token.
    #[arg(long)]
    greedy: bool,

    /// Model preset to initialize: tiny, small or base.
    #[arg(long, default_value = "tiny")]
    model: String,

    /// Seed for weight initialization and sampling.
    #[arg(long, default_value_t = 1234)]
    seed: u64,

    /// Stop a sample when the tokenizer's end-of-sequence token is drawn.
    #[arg(long)]
    eos: bool,

    /// Override the KV cache length.
    #[arg(long)]
    max_seq_length: Option<usize>,

    /// Write a Chrome trace of the last sample to `<PROFILE>.json`.
    #[arg(long)]
    profile: Option<PathBuf>,
}

impl Args {
    fn options(&self, tokenizer: &ByteTokenizer) -> GenerateOptions {
        let vocab_size = tokenizer.vocab_size();
        let top_k = match self.top_k {
            0 => None,
            k if k > vocab_size => {
                warn!(top_k = k, vocab_size, "top_k exceeds vocabulary, clamping");
                Some(vocab_size)
            }
            k => Some(k),
        };
        let sampling = SamplingParams {
            temperature: self.temperature,
            top_k,
            seed: self.seed,
            selector: if self.greedy {
                Selector::Greedy
            } else {
                Selector::Random
            },
        };
        GenerateOptions {
            max_new_tokens: self.max_new_tokens,
            max_seq_length: self.max_seq_length,
            sampling,
            eos_id: self.eos.then(|| tokenizer.eos_id()),
        }
    }

    fn encode_prompt(&self, tokenizer: &ByteTokenizer) -> Vec<u32> {
        let encoded = tokenizer.encode(&self.prompt, true, false);
        match self.prompt_synthetic {
            Some(n) => {
                let max_id = encoded.iter().copied().max().unwrap_or(1).max(1);
                let mut rng = StdRng::seed_from_u64(self.seed);
                (0..n).map(|_| rng.gen_range(0..max_id)).collect()
            }
            None => encoded,
        }
    }
}

/// Human-readable log lines, filtered by `RUST_LOG` (default `info`).
fn log_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_filter(filter)
}

/// Run `f` with a Chrome trace layer added next to the usual log lines,
/// writing `<path>.json`.
fn with_profile<T, W>(path: &Path, writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let mut file = path.as_os_str().to_owned();
    file.push(".json");
    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
        .file(PathBuf::from(file))
        .include_args(true)
        .build();
    let subscriber = tracing_subscriber::registry()
        .with(log_layer(writer))
        .with(chrome_layer);
    let out = tracing::subscriber::with_default(subscriber, f);
    drop(guard);
    out
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(log_layer(std::io::stderr))
        .init();

    let args = Args::parse();

    info!("Loading model ...");
    let start = Instant::now();
    let mut model = LlamaModel::from_name(&args.model, args.seed)
        .with_context(|| format!("failed to build model preset '{}'", args.model))?;
    info!(
        "Time to load model: {:.02} seconds.",
        start.elapsed().as_secs_f64()
    );

    let tokenizer = ByteTokenizer::new();
    let encoded = args.encode_prompt(&tokenizer);
    let prompt_length = encoded.len();
    let model_size = model.parameter_bytes();

    let mut generator = Generator::with_executor(
        TimedStep::new(EagerStep),
        args.options(&tokenizer),
        model.vocab_size(),
    )
    .context("invalid generation options")?;

    for i in 0..args.num_samples {
        let start = Instant::now();
        let profile = args.profile.as_deref().filter(|_| i + 1 == args.num_samples);
        let result = match profile {
            Some(path) => with_profile(path, std::io::stderr, || {
                generator.generate(&mut model, &encoded)
            }),
            None => generator.generate(&mut model, &encoded),
        };
        let tokens = result.with_context(|| format!("sample {} failed", i + 1))?;
        let t = start.elapsed().as_secs_f64();

        model.reset_cache();
        println!("{}", tokenizer.decode(&tokens));

        let tokens_generated = tokens.len() - prompt_length;
        let tokens_sec = tokens_generated as f64 / t;
        let timings = generator.executor_mut().take_timings();
        info!(
            "Time for inference {}: {:.02} sec total, {:.02} tokens/sec",
            i + 1,
            t,
            tokens_sec
        );
        info!(
            prefill = ?timings.prefill,
            mean_decode = ?timings.mean_decode(),
            "step timings"
        );
        info!(
            "Bandwidth achieved: {:.02} GB/s",
            model_size as f64 * tokens_sec / 1e9
        );
    }

    Ok(())
}
