use crate::sampler::{Sampler, TokenLogit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Greedy sampler: selects the single token with the highest logit.
///
/// Ties resolve to the earliest candidate (lowest token id).
#[derive(Debug, Default)]
pub struct GreedySampler;

impl GreedySampler {
    pub fn new() -> Self {
        Self
    }
}

impl Sampler for GreedySampler {
    fn name(&self) -> &str {
        "greedy"
    }

    fn apply(&mut self, logits: &mut Vec<TokenLogit>) {
        let mut best: Option<usize> = None;
        for (i, t) in logits.iter().enumerate() {
            match best {
                Some(b) if logits[b].logit >= t.logit => {}
                _ => best = Some(i),
            }
        }
        if let Some(b) = best {
            logits.swap(0, b);
            logits.truncate(1);
        }
    }
}

/// Numerically stable softmax over a slice of logits.
///
/// The maximum is subtracted before exponentiation, so very large or very
/// small finite scores never overflow. Scores of `+inf` share all of the mass;
/// a slice that is entirely `-inf` yields a uniform distribution.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if max_logit == f32::INFINITY {
        let n = logits.iter().filter(|&&l| l == f32::INFINITY).count() as f32;
        return logits
            .iter()
            .map(|&l| if l == f32::INFINITY { 1.0 / n } else { 0.0 })
            .collect();
    }
    if max_logit == f32::NEG_INFINITY {
        let n = logits.len() as f32;
        return vec![1.0 / n; logits.len()];
    }

    let exps: Vec<f32> = logits.iter().map(|&l| (l - max_logit).exp()).collect();
    // The max element contributes exp(0) = 1, so the sum is never zero.
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Distribution-based sampler: converts logits to probabilities via softmax,
/// then draws one candidate with probability proportional to its mass.
///
/// The draw is an exponential race: every candidate gets an independent
/// `q_i ~ Exp(1)` and the winner is `argmax(p_i / q_i)`. The RNG is seeded
/// once and advances across calls, so a whole generation is reproducible
/// from the seed while each step sees fresh noise.
#[derive(Debug)]
pub struct DistSampler {
    seed: u64,
    rng: StdRng,
}

impl DistSampler {
    /// Create a new distribution sampler with the given seed for reproducibility.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Unit-rate exponential variate.
    fn exp1(&mut self) -> f64 {
        // gen() is in [0, 1), so 1 - u is in (0, 1] and ln never sees zero.
        let u: f64 = self.rng.gen();
        -(1.0 - u).ln()
    }
}

impl Sampler for DistSampler {
    fn name(&self) -> &str {
        "dist"
    }

    fn apply(&mut self, logits: &mut Vec<TokenLogit>) {
        if logits.is_empty() {
            return;
        }

        let scores: Vec<f32> = logits.iter().map(|t| t.logit).collect();
        let probs = softmax(&scores);

        let mut selected = 0;
        let mut best = f64::NEG_INFINITY;
        for (i, &p) in probs.iter().enumerate() {
            // One variate per candidate keeps the RNG stream independent of
            // which candidates happen to have zero mass.
            let q = self.exp1();
            if p <= 0.0 {
                continue;
            }
            let key = p as f64 / q;
            if key > best {
                best = key;
                selected = i;
            }
        }

        logits.swap(0, selected);
        logits.truncate(1);
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn candidates(values: &[f32]) -> Vec<TokenLogit> {
        values
            .iter()
            .enumerate()
            .map(|(i, &logit)| TokenLogit {
                token_id: i as u32,
                logit,
            })
            .collect()
    }

    fn draw(sampler: &mut DistSampler, values: &[f32]) -> u32 {
        let mut logits = candidates(values);
        sampler.apply(&mut logits);
        assert_eq!(logits.len(), 1);
        logits[0].token_id
    }

    #[test]
    fn test_greedy_picks_max() {
        let mut g = GreedySampler::new();
        let mut logits = candidates(&[0.1, 2.5, -1.0, 2.0]);
        g.apply(&mut logits);
        assert_eq!(logits.len(), 1);
        assert_eq!(logits[0].token_id, 1);
    }

    #[test]
    fn test_greedy_tie_prefers_lowest_id() {
        let mut g = GreedySampler::new();
        let mut logits = candidates(&[1.0, 3.0, 3.0, 0.0]);
        g.apply(&mut logits);
        assert_eq!(logits[0].token_id, 1);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = p.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(p[0] < p[1] && p[1] < p[2]);
    }

    #[test]
    fn test_softmax_extreme_values() {
        let p = softmax(&[1e30, -1e30, 0.0, f32::MAX, f32::MIN]);
        assert!(p.iter().all(|x| x.is_finite()));
        let sum: f32 = p.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p[3], 1.0, epsilon = 1e-6);

        let p = softmax(&[f32::INFINITY, 0.0, f32::INFINITY]);
        assert_eq!(p, vec![0.5, 0.0, 0.5]);

        let p = softmax(&[f32::NEG_INFINITY, f32::NEG_INFINITY]);
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_dist_same_seed_same_draws() {
        let values = [0.5, 0.1, 0.3, 0.2, 0.4];
        let mut a = DistSampler::new(7);
        let mut b = DistSampler::new(7);
        for _ in 0..20 {
            assert_eq!(draw(&mut a, &values), draw(&mut b, &values));
        }
    }

    #[test]
    fn test_dist_reset_replays_stream() {
        let values = [0.0; 16];
        let mut s = DistSampler::new(99);
        let first: Vec<u32> = (0..8).map(|_| draw(&mut s, &values)).collect();
        s.reset();
        let replay: Vec<u32> = (0..8).map(|_| draw(&mut s, &values)).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_dist_never_picks_masked() {
        let mut s = DistSampler::new(3);
        let values = [f32::NEG_INFINITY, 0.0, f32::NEG_INFINITY, 0.0];
        for _ in 0..200 {
            let id = draw(&mut s, &values);
            assert!(id == 1 || id == 3);
        }
    }

    #[test]
    fn test_dist_dominant_logit_wins() {
        let mut s = DistSampler::new(11);
        for _ in 0..50 {
            assert_eq!(draw(&mut s, &[0.0, 100.0, 0.0]), 1);
        }
    }

    #[test]
    fn test_dist_matches_distribution() {
        // p = softmax([ln 1, ln 3]) = [0.25, 0.75]
        let values = [0.0f32, 3.0f32.ln()];
        let mut s = DistSampler::new(1234);
        let n = 20_000;
        let hits = (0..n).filter(|_| draw(&mut s, &values) == 1).count();
        let freq = hits as f64 / n as f64;
        assert!((freq - 0.75).abs() < 0.02, "observed frequency {freq}");
    }
}
