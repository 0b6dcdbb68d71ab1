use crate::sampler::{Sampler, TokenLogit};

/// Keeps only candidates scoring at least the k-th largest logit.
///
/// Every candidate equal to the threshold survives, so exact ties at the
/// boundary can let more than `k` candidates through. Candidate order is
/// preserved.
#[derive(Debug)]
pub struct TopKSampler {
    k: usize,
}

impl TopKSampler {
    /// Create a new top-K sampler that retains the `k` highest-logit tokens.
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// Score of the k-th largest logit, or `None` when no truncation applies.
    fn threshold(&self, logits: &[TokenLogit]) -> Option<f32> {
        if self.k == 0 || self.k >= logits.len() {
            return None;
        }
        let mut values: Vec<f32> = logits.iter().map(|t| t.logit).collect();
        let (_, kth, _) = values.select_nth_unstable_by(self.k - 1, |a, b| b.total_cmp(a));
        Some(*kth)
    }
}

impl Sampler for TopKSampler {
    fn name(&self) -> &str {
        "top_k"
    }

    fn apply(&mut self, logits: &mut Vec<TokenLogit>) {
        if let Some(threshold) = self.threshold(logits) {
            logits.retain(|t| t.logit >= threshold);
        }
    }
}
