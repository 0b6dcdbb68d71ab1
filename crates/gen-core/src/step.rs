use std::time::{Duration, Instant};

use gen_model::LanguageModel;
use gen_sampler::SamplerChain;
use tracing::{trace, trace_span};

use crate::error::{GenerateError, Result};

/// Runs one model invocation and samples the next token from its logits.
///
/// Chosen once when a [`Generator`](crate::Generator) is built; the loop
/// only ever talks to this interface.
pub trait StepExecutor {
    /// Run the whole prompt at `positions` (normally `0..prompt.len()`),
    /// populating the cache, and sample the token that follows.
    fn prefill(
        &mut self,
        model: &mut dyn LanguageModel,
        positions: &[usize],
        tokens: &[u32],
        sampler: &mut SamplerChain,
    ) -> Result<u32>;

    /// Run exactly one token at its single absolute position and sample the
    /// token that follows.
    fn decode(
        &mut self,
        model: &mut dyn LanguageModel,
        positions: &[usize],
        tokens: &[u32],
        sampler: &mut SamplerChain,
    ) -> Result<u32>;
}

/// Calls the model directly, with no per-step bookkeeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct EagerStep;

impl StepExecutor for EagerStep {
    fn prefill(
        &mut self,
        model: &mut dyn LanguageModel,
        positions: &[usize],
        tokens: &[u32],
        sampler: &mut SamplerChain,
    ) -> Result<u32> {
        let _span = trace_span!("prefill", n_tokens = tokens.len()).entered();
        let logits = model.forward(tokens, positions)?;
        Ok(sampler.sample(&logits)?)
    }

    fn decode(
        &mut self,
        model: &mut dyn LanguageModel,
        positions: &[usize],
        tokens: &[u32],
        sampler: &mut SamplerChain,
    ) -> Result<u32> {
        if positions.len() != 1 || tokens.len() != 1 {
            return Err(GenerateError::DecodeShape {
                tokens: tokens.len(),
                positions: positions.len(),
            });
        }
        let _span = trace_span!("decode", pos = positions[0]).entered();
        let logits = model.forward(tokens, positions)?;
        Ok(sampler.sample(&logits)?)
    }
}

/// Wall-clock time spent per phase.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepTimings {
    pub prefill: Duration,
    pub decode: Duration,
    pub decode_steps: usize,
}

impl StepTimings {
    pub fn total(&self) -> Duration {
        self.prefill + self.decode
    }

    /// Mean decode latency, or zero before the first decode step.
    pub fn mean_decode(&self) -> Duration {
        match u32::try_from(self.decode_steps) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.decode / n,
        }
    }
}

/// Wraps another executor and accumulates how long each phase took.
#[derive(Debug, Default)]
pub struct TimedStep<S> {
    inner: S,
    timings: StepTimings,
}

impl<S: StepExecutor> TimedStep<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            timings: StepTimings::default(),
        }
    }

    pub fn timings(&self) -> StepTimings {
        self.timings
    }

    /// Return the accumulated timings and start over.
    pub fn take_timings(&mut self) -> StepTimings {
        std::mem::take(&mut self.timings)
    }
}

impl<S: StepExecutor> StepExecutor for TimedStep<S> {
    fn prefill(
        &mut self,
        model: &mut dyn LanguageModel,
        positions: &[usize],
        tokens: &[u32],
        sampler: &mut SamplerChain,
    ) -> Result<u32> {
        let start = Instant::now();
        let token = self.inner.prefill(model, positions, tokens, sampler)?;
        let elapsed = start.elapsed();
        self.timings.prefill += elapsed;
        trace!(n_tokens = tokens.len(), ?elapsed, "prefill");
        Ok(token)
    }

    fn decode(
        &mut self,
        model: &mut dyn LanguageModel,
        positions: &[usize],
        tokens: &[u32],
        sampler: &mut SamplerChain,
    ) -> Result<u32> {
        let start = Instant::now();
        let token = self.inner.decode(model, positions, tokens, sampler)?;
        let elapsed = start.elapsed();
        self.timings.decode += elapsed;
        self.timings.decode_steps += 1;
        trace!(?positions, ?elapsed, "decode");
        Ok(token)
    }
}
