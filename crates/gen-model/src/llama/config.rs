use crate::error::{ModelError, Result};
use crate::tokenizer::ByteTokenizer;

/// Hyperparameters of a LLaMA-style model.
#[derive(Debug, Clone, PartialEq)]
pub struct LlamaConfig {
    /// Vocabulary size (number of token embeddings).
    pub n_vocab: usize,
    /// Embedding dimension / hidden size.
    pub n_embd: usize,
    /// Number of attention heads for queries.
    pub n_heads: usize,
    /// Number of attention heads for keys/values (GQA).
    pub n_kv_heads: usize,
    /// Number of transformer layers.
    pub n_layers: usize,
    /// Feed-forward intermediate dimension.
    pub n_ff: usize,
    /// RMS normalization epsilon.
    pub norm_eps: f32,
    /// Maximum sequence length / context window size.
    pub max_seq_len: usize,
    /// RoPE frequency base (theta).
    pub rope_theta: f32,
    /// Dimension of each attention head (n_embd / n_heads).
    pub head_dim: usize,
}

impl LlamaConfig {
    /// Build and validate a config. Vocabulary defaults to the byte tokenizer.
    pub fn new(
        n_embd: usize,
        n_heads: usize,
        n_kv_heads: usize,
        n_layers: usize,
        n_ff: usize,
        max_seq_len: usize,
    ) -> Result<LlamaConfig> {
        if n_embd == 0 || n_heads == 0 || n_kv_heads == 0 || n_layers == 0 || n_ff == 0 {
            return Err(ModelError::InvalidConfig(
                "dimensions must be non-zero".to_string(),
            ));
        }
        if max_seq_len == 0 {
            return Err(ModelError::InvalidConfig(
                "max_seq_len must be non-zero".to_string(),
            ));
        }
        if n_embd % n_heads != 0 {
            return Err(ModelError::InvalidConfig(format!(
                "n_embd {} is not divisible by n_heads {}",
                n_embd, n_heads
            )));
        }
        if n_heads % n_kv_heads != 0 {
            return Err(ModelError::InvalidConfig(format!(
                "n_heads {} is not a multiple of n_kv_heads {}",
                n_heads, n_kv_heads
            )));
        }
        let head_dim = n_embd / n_heads;
        if head_dim % 2 != 0 {
            return Err(ModelError::InvalidConfig(format!(
                "head_dim {} must be even for rotary embeddings",
                head_dim
            )));
        }

        Ok(LlamaConfig {
            n_vocab: ByteTokenizer::VOCAB_SIZE,
            n_embd,
            n_heads,
            n_kv_heads,
            n_layers,
            n_ff,
            norm_eps: 1e-5,
            max_seq_len,
            rope_theta: 10000.0,
            head_dim,
        })
    }

    /// Look up a named preset: `tiny`, `small` or `base`.
    pub fn from_name(name: &str) -> Result<LlamaConfig> {
        match name {
            "tiny" => Self::new(64, 4, 2, 2, 176, 256),
            "small" => Self::new(128, 8, 4, 4, 352, 512),
            "base" => Self::new(256, 8, 8, 6, 688, 1024),
            other => Err(ModelError::UnknownPreset(other.to_string())),
        }
    }

    /// Width of one position's key (or value) vector across all KV heads.
    pub fn kv_dim(&self) -> usize {
        self.n_kv_heads * self.head_dim
    }

    /// Total parameter count, with the output head tied to the embeddings.
    pub fn n_params(&self) -> usize {
        let q_dim = self.n_heads * self.head_dim;
        let per_layer = 2 * self.n_embd
            + q_dim * self.n_embd
            + 2 * self.kv_dim() * self.n_embd
            + self.n_embd * q_dim
            + 3 * self.n_ff * self.n_embd;
        self.n_vocab * self.n_embd + self.n_embd + self.n_layers * per_layer
    }
}
