use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("no tokens to process")]
    EmptyInput,
    #[error("got {tokens} tokens but {positions} positions")]
    PositionMismatch { tokens: usize, positions: usize },
    #[error("KV cache not initialized; call setup_cache first")]
    CacheNotInitialized,
    #[error("requested cache length {requested} exceeds model context {capacity}")]
    CacheCapacity { requested: usize, capacity: usize },
    #[error("only one concurrent sequence is supported, got {0}")]
    UnsupportedBatch(usize),
    #[error("position {pos} is outside the cache (capacity {capacity})")]
    PositionOutOfRange { pos: usize, capacity: usize },
    #[error("position {pos} skips ahead of the {filled} cached positions")]
    NonContiguousPosition { pos: usize, filled: usize },
    #[error("token id {token} exceeds vocab size {vocab_size}")]
    TokenOutOfVocab { token: u32, vocab_size: usize },
    #[error("unknown model preset: {0}")]
    UnknownPreset(String),
    #[error("invalid model config: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
