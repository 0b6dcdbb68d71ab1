pub mod config;
pub mod layers;
pub mod ops;

pub use config::LlamaConfig;
pub use layers::{LlamaLayer, LlamaWeights};

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::kv_cache::KvCache;
use crate::model::LanguageModel;

/// A LLaMA-style transformer held entirely in f32.
///
/// Weights are randomly initialized from a seed; the cache is allocated by
/// [`LanguageModel::setup_cache`] and sized to the generation that needs it.
pub struct LlamaModel {
    /// Model hyperparameters.
    pub config: LlamaConfig,
    /// All weight tensors.
    pub weights: LlamaWeights,
    cache: Option<KvCache>,
}

impl LlamaModel {
    /// Random-initialize a model with the given configuration.
    pub fn random(config: LlamaConfig, seed: u64) -> LlamaModel {
        let weights = LlamaWeights::random(&config, seed);
        LlamaModel {
            config,
            weights,
            cache: None,
        }
    }

    /// Random-initialize a named preset (see [`LlamaConfig::from_name`]).
    pub fn from_name(name: &str, seed: u64) -> Result<LlamaModel> {
        let config = LlamaConfig::from_name(name)?;
        debug!(
            preset = name,
            n_layers = config.n_layers,
            n_embd = config.n_embd,
            "initializing model"
        );
        Ok(Self::random(config, seed))
    }

    /// Returns a reference to the model configuration.
    pub fn config(&self) -> &LlamaConfig {
        &self.config
    }

    /// Positions currently held in the cache, or `None` before setup.
    pub fn cached_len(&self) -> Option<usize> {
        self.cache.as_ref().map(KvCache::len)
    }

    /// Run one token through every layer, storing its K/V at `pos`, and
    /// return the final hidden state.
    fn forward_token(&mut self, token_id: u32, pos: usize) -> Result<Vec<f32>> {
        let cfg = &self.config;
        let cache = self.cache.as_mut().ok_or(ModelError::CacheNotInitialized)?;
        cache.check_position(pos)?;

        let n_embd = cfg.n_embd;
        let head_dim = cfg.head_dim;
        let q_dim = cfg.n_heads * head_dim;
        let kv_dim = cfg.kv_dim();
        let heads_per_kv = cfg.n_heads / cfg.n_kv_heads;
        let scale = 1.0 / (head_dim as f32).sqrt();
        let seq_len = pos + 1;

        let embd_offset = token_id as usize * n_embd;
        let mut hidden = self.weights.token_embd[embd_offset..embd_offset + n_embd].to_vec();

        for (layer_idx, layer) in self.weights.layers.iter().enumerate() {
            // Attention.
            let normed = ops::rms_norm(&hidden, &layer.attn_norm, cfg.norm_eps);
            let mut q = ops::matvec(&layer.wq, &normed, q_dim, n_embd);
            let mut k = ops::matvec(&layer.wk, &normed, kv_dim, n_embd);
            let v = ops::matvec(&layer.wv, &normed, kv_dim, n_embd);
            ops::rope(&mut q, head_dim, pos, cfg.rope_theta);
            ops::rope(&mut k, head_dim, pos, cfg.rope_theta);

            cache.write(layer_idx, pos, &k, &v)?;
            let keys = cache.keys(layer_idx, seq_len);
            let values = cache.values(layer_idx, seq_len);

            let mut attn = vec![0.0f32; q_dim];
            let mut scores = vec![0.0f32; seq_len];
            for h in 0..cfg.n_heads {
                let kv_off = (h / heads_per_kv) * head_dim;
                let q_head = &q[h * head_dim..(h + 1) * head_dim];

                // Only positions 0..=pos are visible, so the mask is implicit.
                for (s, score) in scores.iter_mut().enumerate() {
                    let k_row = &keys[s * kv_dim + kv_off..s * kv_dim + kv_off + head_dim];
                    *score = q_head.iter().zip(k_row).map(|(a, b)| a * b).sum::<f32>() * scale;
                }
                ops::softmax_inplace(&mut scores);

                let out = &mut attn[h * head_dim..(h + 1) * head_dim];
                for (s, &p) in scores.iter().enumerate() {
                    let v_row = &values[s * kv_dim + kv_off..s * kv_dim + kv_off + head_dim];
                    for (o, &x) in out.iter_mut().zip(v_row) {
                        *o += p * x;
                    }
                }
            }

            let attn_proj = ops::matvec(&layer.wo, &attn, n_embd, q_dim);
            for (h, a) in hidden.iter_mut().zip(&attn_proj) {
                *h += a;
            }

            // SwiGLU feed-forward.
            let ffn_normed = ops::rms_norm(&hidden, &layer.ffn_norm, cfg.norm_eps);
            let gate = ops::matvec(&layer.ffn_gate, &ffn_normed, cfg.n_ff, n_embd);
            let up = ops::matvec(&layer.ffn_up, &ffn_normed, cfg.n_ff, n_embd);
            let gate_up: Vec<f32> = gate
                .iter()
                .zip(&up)
                .map(|(&g, &u)| ops::silu(g) * u)
                .collect();
            let ffn_out = ops::matvec(&layer.ffn_down, &gate_up, n_embd, cfg.n_ff);
            for (h, f) in hidden.iter_mut().zip(&ffn_out) {
                *h += f;
            }
        }

        cache.commit(pos);
        Ok(hidden)
    }
}

impl LanguageModel for LlamaModel {
    /// Tokens run one after another; only the last one goes through the
    /// final norm and the tied LM head.
    fn forward(&mut self, tokens: &[u32], positions: &[usize]) -> Result<Vec<f32>> {
        if tokens.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        if tokens.len() != positions.len() {
            return Err(ModelError::PositionMismatch {
                tokens: tokens.len(),
                positions: positions.len(),
            });
        }
        let n_vocab = self.config.n_vocab;
        if let Some(&token) = tokens.iter().find(|&&t| t as usize >= n_vocab) {
            return Err(ModelError::TokenOutOfVocab {
                token,
                vocab_size: n_vocab,
            });
        }

        let mut hidden = Vec::new();
        for (&token, &pos) in tokens.iter().zip(positions) {
            hidden = self.forward_token(token, pos)?;
        }

        let normed = ops::rms_norm(&hidden, &self.weights.output_norm, self.config.norm_eps);
        Ok(ops::matvec(
            &self.weights.token_embd,
            &normed,
            n_vocab,
            self.config.n_embd,
        ))
    }

    fn setup_cache(&mut self, max_sequences: usize, max_length: usize) -> Result<()> {
        if max_sequences != 1 {
            return Err(ModelError::UnsupportedBatch(max_sequences));
        }
        if max_length == 0 || max_length > self.config.max_seq_len {
            return Err(ModelError::CacheCapacity {
                requested: max_length,
                capacity: self.config.max_seq_len,
            });
        }

        if let Some(cache) = self.cache.as_mut().filter(|c| c.capacity() == max_length) {
            cache.reset();
            return Ok(());
        }
        debug!(max_length, "allocating KV cache");
        self.cache = Some(KvCache::new(
            self.config.n_layers,
            self.config.kv_dim(),
            max_length,
        ));
        Ok(())
    }

    fn reset_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.reset();
        }
    }

    fn max_context_len(&self) -> usize {
        self.config.max_seq_len
    }

    fn vocab_size(&self) -> usize {
        self.config.n_vocab
    }

    fn parameter_bytes(&self) -> usize {
        self.weights.len() * std::mem::size_of::<f32>()
    }
}
