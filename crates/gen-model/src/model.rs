/// A stateful autoregressive model with a position-indexed KV cache.
///
/// One generation at a time: the cache belongs to whichever call set it up
/// last. Interleaving two generations on one instance without a
/// [`reset_cache`](LanguageModel::reset_cache) in between is the caller's
/// mistake and is not detected.
pub trait LanguageModel: Send {
    /// Run the model over `tokens` placed at the absolute `positions`,
    /// writing their key/value state into the cache.
    ///
    /// Returns logits over the vocabulary for the last input token.
    /// `positions` must correspond 1:1 with `tokens`.
    fn forward(&mut self, tokens: &[u32], positions: &[usize]) -> crate::Result<Vec<f32>>;

    /// Allocate cache state for `max_sequences` sequences of up to
    /// `max_length` positions. Must be called before the first `forward`
    /// of a generation.
    fn setup_cache(&mut self, max_sequences: usize, max_length: usize) -> crate::Result<()>;

    /// Clear all cached state, readying the model for an unrelated generation.
    fn reset_cache(&mut self);

    /// Longest sequence the model supports.
    fn max_context_len(&self) -> usize;

    /// Returns the vocabulary size (number of output logits).
    fn vocab_size(&self) -> usize;

    /// Bytes of parameters and buffers touched per step; used for bandwidth reporting.
    fn parameter_bytes(&self) -> usize {
        0
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn forward(&mut self, tokens: &[u32], positions: &[usize]) -> crate::Result<Vec<f32>> {
        (**self).forward(tokens, positions)
    }

    fn setup_cache(&mut self, max_sequences: usize, max_length: usize) -> crate::Result<()> {
        (**self).setup_cache(max_sequences, max_length)
    }

    fn reset_cache(&mut self) {
        (**self).reset_cache()
    }

    fn max_context_len(&self) -> usize {
        (**self).max_context_len()
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn parameter_bytes(&self) -> usize {
        (**self).parameter_bytes()
    }
}
