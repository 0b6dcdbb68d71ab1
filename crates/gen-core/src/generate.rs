use gen_model::LanguageModel;
use gen_sampler::{SamplerChain, SamplingParams};
use tracing::{debug, info_span, trace};

use crate::buffer::TokenBuffer;
use crate::error::{GenerateError, Result};
use crate::step::{EagerStep, StepExecutor};

/// Parameters controlling one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Tokens to append after the prompt. Must be at least 1.
    pub max_new_tokens: usize,
    /// Cache length override. Defaults to `min(prompt + max_new_tokens, model context)`.
    pub max_seq_length: Option<usize>,
    pub sampling: SamplingParams,
    /// Stop as soon as this token is sampled; it is kept in the output.
    pub eos_id: Option<u32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 50,
            max_seq_length: None,
            sampling: SamplingParams::default(),
            eos_id: None,
        }
    }
}

/// Generation loop bound to a step strategy and a sampler.
///
/// The sampler's random stream carries over between calls, so repeated
/// calls with one `Generator` give different samples while the whole series
/// stays reproducible from the seed.
///
/// The model's cache is set up at the start of every call but never reset
/// afterwards: call [`LanguageModel::reset_cache`] once the result has been
/// consumed and before reusing the model for something unrelated.
pub struct Generator<S = EagerStep> {
    executor: S,
    sampler: SamplerChain,
    options: GenerateOptions,
}

impl Generator<EagerStep> {
    /// Build a generator that calls the model directly.
    pub fn new(options: GenerateOptions, vocab_size: usize) -> Result<Self> {
        Self::with_executor(EagerStep, options, vocab_size)
    }
}

impl<S: StepExecutor> Generator<S> {
    /// Build a generator around a specific step strategy.
    pub fn with_executor(executor: S, options: GenerateOptions, vocab_size: usize) -> Result<Self> {
        if options.max_new_tokens == 0 {
            return Err(GenerateError::NoNewTokens);
        }
        let sampler = SamplerChain::from_params(&options.sampling, vocab_size)?;
        Ok(Self {
            executor,
            sampler,
            options,
        })
    }

    pub fn executor(&self) -> &S {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut S {
        &mut self.executor
    }

    /// Rewind the sampler's random stream to its seed.
    pub fn reset_sampler(&mut self) {
        self.sampler.reset();
    }

    /// Continue `prompt` with up to `max_new_tokens` sampled tokens.
    ///
    /// Returns the prompt followed by the generated tokens. If the EOS token
    /// is drawn the result ends with it. Any model or sampling failure aborts
    /// the call and leaves the cache in an unspecified state.
    pub fn generate(&mut self, model: &mut dyn LanguageModel, prompt: &[u32]) -> Result<Vec<u32>> {
        let opts = &self.options;
        let _span = info_span!(
            "generate",
            prompt_len = prompt.len(),
            max_new_tokens = opts.max_new_tokens
        )
        .entered();

        let (cache_len, total_len) = validate(model, prompt, opts)?;
        let prompt_len = prompt.len();

        model.setup_cache(1, cache_len)?;
        debug!(cache_len, sampler = %self.sampler.describe(), "cache ready");

        let mut seq = TokenBuffer::from_prompt(prompt, total_len)?;

        let positions: Vec<usize> = (0..prompt_len).collect();
        let mut next = self
            .executor
            .prefill(model, &positions, prompt, &mut self.sampler)?;
        seq.push(next)?;
        debug!(token = next, "prefill done");

        if opts.eos_id == Some(next) {
            debug!(generated = 1, "eos after prefill");
            return Ok(seq.into_tokens());
        }

        // Decode position == index of the token being fed == last written slot.
        let mut pos = prompt_len;
        for _ in 1..opts.max_new_tokens {
            next = self
                .executor
                .decode(model, &[pos], &[next], &mut self.sampler)?;
            pos += 1;
            seq.push(next)?;
            trace!(pos, token = next, "decoded");

            if opts.eos_id == Some(next) {
                debug!(generated = pos + 1 - prompt_len, "eos");
                break;
            }
        }

        Ok(seq.into_tokens())
    }
}

/// One-shot generation with the default step strategy and a fresh sampler.
pub fn generate(
    model: &mut dyn LanguageModel,
    prompt: &[u32],
    options: &GenerateOptions,
) -> Result<Vec<u32>> {
    Generator::new(options.clone(), model.vocab_size())?.generate(model, prompt)
}

/// Check every precondition before any step runs.
///
/// Returns the cache length and the full output length.
fn validate(
    model: &dyn LanguageModel,
    prompt: &[u32],
    opts: &GenerateOptions,
) -> Result<(usize, usize)> {
    if prompt.is_empty() {
        return Err(GenerateError::EmptyPrompt);
    }
    if opts.max_new_tokens == 0 {
        return Err(GenerateError::NoNewTokens);
    }

    let vocab_size = model.vocab_size();
    opts.sampling.validate(vocab_size)?;
    if let Some(&token) = prompt.iter().find(|&&t| t as usize >= vocab_size) {
        return Err(GenerateError::TokenOutOfVocab { token, vocab_size });
    }

    let total_len = prompt
        .len()
        .checked_add(opts.max_new_tokens)
        .ok_or(GenerateError::LengthOverflow {
            prompt_len: prompt.len(),
            max_new_tokens: opts.max_new_tokens,
        })?;
    let context = model.max_context_len();
    let cache_len = opts.max_seq_length.unwrap_or(total_len.min(context));
    if cache_len > context {
        return Err(GenerateError::CacheCapacity {
            required: cache_len,
            available: context,
        });
    }

    // The final sampled token is never fed back, so the cache holds one
    // position fewer than the output.
    let required = total_len - 1;
    if cache_len < required {
        return Err(GenerateError::CacheCapacity {
            required,
            available: cache_len,
        });
    }
    Ok((cache_len, total_len))
}
