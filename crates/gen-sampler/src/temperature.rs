use crate::error::{Result, SamplerError};
use crate::sampler::{Sampler, TokenLogit};

/// Scales all logits by dividing by a temperature value.
///
/// Higher temperatures produce more uniform distributions (more random),
/// while lower temperatures sharpen the distribution toward the arg-max.
#[derive(Debug)]
pub struct TemperatureSampler {
    temperature: f32,
}

impl TemperatureSampler {
    /// Create a new temperature sampler. The temperature must be finite and > 0.
    pub fn new(temperature: f32) -> Result<Self> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(SamplerError::InvalidTemperature(temperature));
        }
        Ok(Self { temperature })
    }
}

impl Sampler for TemperatureSampler {
    fn name(&self) -> &str {
        "temperature"
    }

    fn apply(&mut self, logits: &mut Vec<TokenLogit>) {
        if self.temperature == 1.0 {
            return;
        }
        for token in logits.iter_mut() {
            token.logit /= self.temperature;
        }
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

    #[test]
    fn test_scales_logits() {
        let mut t = TemperatureSampler::new(0.5).unwrap();
        let mut logits = candidates(&[1.0, -2.0, 3.0]);
        t.apply(&mut logits);
        assert_relative_eq!(logits[0].logit, 2.0);
        assert_relative_eq!(logits[1].logit, -4.0);
        assert_relative_eq!(logits[2].logit, 6.0);
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(
            TemperatureSampler::new(0.0).unwrap_err(),
            SamplerError::InvalidTemperature(0.0)
        );
        assert!(TemperatureSampler::new(-1.0).is_err());
        assert!(TemperatureSampler::new(f32::NAN).is_err());
        assert!(TemperatureSampler::new(f32::INFINITY).is_err());
    }
}
