use thiserror::Error;

use gen_model::ModelError;
use gen_sampler::SamplerError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("prompt must contain at least one token")]
    EmptyPrompt,
    #[error("max_new_tokens must be at least 1")]
    NoNewTokens,
    #[error("decode step takes exactly one token and one position, got {tokens} tokens and {positions} positions")]
    DecodeShape { tokens: usize, positions: usize },
    #[error("prompt of {prompt_len} tokens plus {max_new_tokens} new tokens overflows the sequence length")]
    LengthOverflow {
        prompt_len: usize,
        max_new_tokens: usize,
    },
    #[error("generation needs {required} cache positions but only {available} are available")]
    CacheCapacity { required: usize, available: usize },
    #[error("prompt token {token} is outside the vocabulary of {vocab_size}")]
    TokenOutOfVocab { token: u32, vocab_size: usize },
    #[error("token buffer is full ({capacity} tokens)")]
    BufferFull { capacity: usize },
    #[error("sampling failed: {0}")]
    Sampler(#[from] SamplerError),
    #[error("model failed: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, GenerateError>;
