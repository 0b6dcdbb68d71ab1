use crate::error::{Result, SamplerError};

/// A token ID paired with its logit value.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLogit {
    pub token_id: u32,
    pub logit: f32,
}

/// One stage of the sampling pipeline.
///
/// Filters rescale or drop candidates; selectors reduce the list to a single
/// candidate. Stages may carry state (a random source), hence `&mut self`.
pub trait Sampler: Send {
    /// Returns the name of this sampler.
    fn name(&self) -> &str;

    /// Modify the candidate list in-place.
    fn apply(&mut self, logits: &mut Vec<TokenLogit>);

    /// Reset any internal state. Default implementation does nothing.
    fn reset(&mut self) {}
}

/// Composes multiple samplers into a pipeline.
/// The last sampler in the chain should be a selector (greedy or random).
#[derive(Default)]
pub struct SamplerChain {
    samplers: Vec<Box<dyn Sampler>>,
}

impl SamplerChain {
    /// Create a new empty sampler chain.
    pub fn new() -> Self {
        Self {
            samplers: Vec::new(),
        }
    }

    /// Add a sampler to the end of the chain. Returns self for builder-style usage.
    pub fn with(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.samplers.push(sampler);
        self
    }

    /// Stage names in execution order, e.g. `temperature -> top_k -> dist`.
    pub fn describe(&self) -> String {
        self.samplers
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Run all samplers in order on raw logits and return the selected token ID.
    ///
    /// Token ids are the logit indices. Fails if `logits` is empty or if the
    /// chain does not narrow the candidates down to exactly one.
    pub fn sample(&mut self, logits: &[f32]) -> Result<u32> {
        if logits.is_empty() {
            return Err(SamplerError::EmptyLogits);
        }

        let mut token_logits: Vec<TokenLogit> = logits
            .iter()
            .enumerate()
            .map(|(i, &logit)| TokenLogit {
                token_id: i as u32,
                logit,
            })
            .collect();

        for sampler in &mut self.samplers {
            sampler.apply(&mut token_logits);
        }

        match token_logits.as_slice() {
            [selected] => Ok(selected.token_id),
            rest => Err(SamplerError::Unselected(rest.len())),
        }
    }

    /// Reset every stage, e.g. to replay a seeded draw sequence from the start.
    pub fn reset(&mut self) {
        for sampler in &mut self.samplers {
            sampler.reset();
        }
    }
}
