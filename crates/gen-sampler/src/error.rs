use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("temperature must be finite and > 0, got {0}")]
    InvalidTemperature(f32),
    #[error("top_k must be in [1, {vocab_size}], got {top_k}")]
    InvalidTopK { top_k: usize, vocab_size: usize },
    #[error("cannot sample from an empty logits vector")]
    EmptyLogits,
    #[error("sampler chain left {0} candidates; the last stage must select one token")]
    Unselected(usize),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
