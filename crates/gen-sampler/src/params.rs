use crate::error::{Result, SamplerError};
use crate::greedy::{DistSampler, GreedySampler};
use crate::sampler::SamplerChain;
use crate::temperature::TemperatureSampler;
use crate::top_k::TopKSampler;

/// How the final candidate is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Always the arg-max. Equivalent to a temperature approaching zero.
    Greedy,
    /// Weighted random draw from the softmax distribution.
    Random,
}

/// Parameters controlling token sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    /// Divides logits before normalization. Must be finite and > 0.
    pub temperature: f32,
    /// Keep only candidates scoring at least the k-th best logit.
    pub top_k: Option<usize>,
    /// Seed for the random selector.
    pub seed: u64,
    pub selector: Selector,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_k: Some(200),
            seed: 1234,
            selector: Selector::Random,
        }
    }
}

impl SamplingParams {
    /// Deterministic arg-max sampling.
    pub fn greedy() -> Self {
        Self {
            temperature: 1.0,
            top_k: None,
            seed: 0,
            selector: Selector::Greedy,
        }
    }

    /// Check the parameters against a vocabulary of `vocab_size` tokens.
    pub fn validate(&self, vocab_size: usize) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(SamplerError::InvalidTemperature(self.temperature));
        }
        if let Some(top_k) = self.top_k {
            if top_k == 0 || top_k > vocab_size {
                return Err(SamplerError::InvalidTopK { top_k, vocab_size });
            }
        }
        Ok(())
    }
}

impl SamplerChain {
    /// Build the `temperature -> top_k -> selector` pipeline for `params`.
    pub fn from_params(params: &SamplingParams, vocab_size: usize) -> Result<SamplerChain> {
        params.validate(vocab_size)?;

        let mut chain = SamplerChain::new().with(Box::new(TemperatureSampler::new(
            params.temperature,
        )?));
        if let Some(k) = params.top_k {
            chain = chain.with(Box::new(TopKSampler::new(k)));
        }
        chain = match params.selector {
            Selector::Greedy => chain.with(Box::new(GreedySampler::new())),
            Selector::Random => chain.with(Box::new(DistSampler::new(params.seed))),
        };
        Ok(chain)
    }
}
