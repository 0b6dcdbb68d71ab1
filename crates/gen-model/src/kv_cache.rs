use crate::error::{ModelError, Result};

/// Key-Value cache for transformer attention layers.
///
/// Stores previously computed key and value projections so a decode step
/// only has to process its own token.
///
/// Layout for each layer:
///   k[layer]: flat array of shape [max_seq_len, kv_dim]
///   v[layer]: flat array of shape [max_seq_len, kv_dim]
#[derive(Debug)]
pub struct KvCache {
    k: Vec<Vec<f32>>,
    v: Vec<Vec<f32>>,
    kv_dim: usize,
    max_seq_len: usize,
    /// Number of leading positions written so far.
    len: usize,
}

impl KvCache {
    /// Create a new KV cache with all values initialized to zero.
    pub fn new(n_layers: usize, kv_dim: usize, max_seq_len: usize) -> Self {
        let cache_size = max_seq_len * kv_dim;
        let k = (0..n_layers).map(|_| vec![0.0f32; cache_size]).collect();
        let v = (0..n_layers).map(|_| vec![0.0f32; cache_size]).collect();

        KvCache {
            k,
            v,
            kv_dim,
            max_seq_len,
            len: 0,
        }
    }

    /// Maximum number of positions the cache can hold.
    pub fn capacity(&self) -> usize {
        self.max_seq_len
    }

    /// Number of positions written.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check that `pos` is the next writable position or overwrites an
    /// existing one, and that it fits.
    pub fn check_position(&self, pos: usize) -> Result<()> {
        if pos >= self.max_seq_len {
            return Err(ModelError::PositionOutOfRange {
                pos,
                capacity: self.max_seq_len,
            });
        }
        if pos > self.len {
            return Err(ModelError::NonContiguousPosition {
                pos,
                filled: self.len,
            });
        }
        Ok(())
    }

    /// Write key and value vectors for one token at a given position.
    ///
    /// `k_data` and `v_data` must each hold `kv_dim` values.
    pub fn write(&mut self, layer: usize, pos: usize, k_data: &[f32], v_data: &[f32]) -> Result<()> {
        self.check_position(pos)?;
        if k_data.len() != self.kv_dim || v_data.len() != self.kv_dim {
            return Err(ModelError::Other(format!(
                "kv write expects {} values, got k={} v={}",
                self.kv_dim,
                k_data.len(),
                v_data.len()
            )));
        }

        let offset = pos * self.kv_dim;
        self.k[layer][offset..offset + self.kv_dim].copy_from_slice(k_data);
        self.v[layer][offset..offset + self.kv_dim].copy_from_slice(v_data);
        Ok(())
    }

    /// Mark `pos` as written for every layer. Called once per token after all
    /// layers have stored their state.
    pub fn commit(&mut self, pos: usize) {
        if pos + 1 > self.len {
            self.len = pos + 1;
        }
    }

    /// Keys for positions 0..seq_len, length seq_len * kv_dim.
    pub fn keys(&self, layer: usize, seq_len: usize) -> &[f32] {
        &self.k[layer][..seq_len * self.kv_dim]
    }

    /// Values for positions 0..seq_len, length seq_len * kv_dim.
    pub fn values(&self, layer: usize, seq_len: usize) -> &[f32] {
        &self.v[layer][..seq_len * self.kv_dim]
    }

    /// Reset the cache, zeroing all data and setting length to 0.
    pub fn reset(&mut self) {
        for layer_k in &mut self.k {
            layer_k.fill(0.0);
        }
        for layer_v in &mut self.v {
            layer_v.fill(0.0);
        }
        self.len = 0;
    }
}
