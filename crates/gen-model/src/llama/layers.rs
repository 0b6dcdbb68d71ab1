use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::LlamaConfig;

/// Weight tensors for a single LLaMA transformer layer.
///
/// All weights are stored as flat f32 vectors in row-major order.
pub struct LlamaLayer {
    /// RMS norm weights for the attention sub-layer, length = n_embd.
    pub attn_norm: Vec<f32>,
    /// Query projection weights, shape [n_heads * head_dim, n_embd].
    pub wq: Vec<f32>,
    /// Key projection weights, shape [n_kv_heads * head_dim, n_embd].
    pub wk: Vec<f32>,
    /// Value projection weights, shape [n_kv_heads * head_dim, n_embd].
    pub wv: Vec<f32>,
    /// Output projection weights, shape [n_embd, n_heads * head_dim].
    pub wo: Vec<f32>,
    /// RMS norm weights for the FFN sub-layer, length = n_embd.
    pub ffn_norm: Vec<f32>,
    /// Gate projection weights (w1), shape [n_ff, n_embd].
    pub ffn_gate: Vec<f32>,
    /// Up projection weights (w3), shape [n_ff, n_embd].
    pub ffn_up: Vec<f32>,
    /// Down projection weights (w2), shape [n_embd, n_ff].
    pub ffn_down: Vec<f32>,
}

/// All weight tensors for a LLaMA model. The LM head is tied to `token_embd`.
pub struct LlamaWeights {
    /// Token embedding matrix, shape [n_vocab, n_embd].
    pub token_embd: Vec<f32>,
    /// Final RMS norm weights, length = n_embd.
    pub output_norm: Vec<f32>,
    /// Per-layer weights.
    pub layers: Vec<LlamaLayer>,
}

/// Uniform init in `[-1/sqrt(fan_in), 1/sqrt(fan_in)]`.
fn uniform(rng: &mut StdRng, rows: usize, fan_in: usize) -> Vec<f32> {
    let bound = 1.0 / (fan_in as f32).sqrt();
    (0..rows * fan_in)
        .map(|_| rng.gen_range(-bound..=bound))
        .collect()
}

impl LlamaWeights {
    /// Randomly initialize every weight from `seed`. Norm weights start at 1.
    pub fn random(config: &LlamaConfig, seed: u64) -> LlamaWeights {
        let mut rng = StdRng::seed_from_u64(seed);
        let n_embd = config.n_embd;
        let q_dim = config.n_heads * config.head_dim;
        let kv_dim = config.kv_dim();

        let token_embd: Vec<f32> = (0..config.n_vocab * n_embd)
            .map(|_| rng.gen_range(-1.0f32..=1.0))
            .collect();

        let layers = (0..config.n_layers)
            .map(|_| LlamaLayer {
                attn_norm: vec![1.0; n_embd],
                wq: uniform(&mut rng, q_dim, n_embd),
                wk: uniform(&mut rng, kv_dim, n_embd),
                wv: uniform(&mut rng, kv_dim, n_embd),
                wo: uniform(&mut rng, n_embd, q_dim),
                ffn_norm: vec![1.0; n_embd],
                ffn_gate: uniform(&mut rng, config.n_ff, n_embd),
                ffn_up: uniform(&mut rng, config.n_ff, n_embd),
                ffn_down: uniform(&mut rng, n_embd, config.n_ff),
            })
            .collect();

        LlamaWeights {
            token_embd,
            output_norm: vec![1.0; n_embd],
            layers,
        }
    }

    /// Number of f32 values held.
    pub fn len(&self) -> usize {
        let layers: usize = self
            .layers
            .iter()
            .map(|l| {
                l.attn_norm.len()
                    + l.wq.len()
                    + l.wk.len()
                    + l.wv.len()
                    + l.wo.len()
                    + l.ffn_norm.len()
                    + l.ffn_gate.len()
                    + l.ffn_up.len()
                    + l.ffn_down.len()
            })
            .sum();
        self.token_embd.len() + self.output_norm.len() + layers
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
