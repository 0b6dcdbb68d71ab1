use gen_core::{generate, EagerStep, GenerateError, GenerateOptions, Generator, TimedStep};
use gen_model::llama::{LlamaConfig, LlamaModel};
use gen_model::{LanguageModel, ModelError, Result as ModelResult};
use gen_sampler::{SamplingParams, Selector};

const VOCAB: usize = 128;

/// Deterministic stand-in for a transformer.
///
/// Emits logits whose arg-max is `(3 * last + 1) % VOCAB`, except on the
/// forward call named by `force_at` (1-based), which favors the paired token.
/// Simulates a position-indexed cache and records every call.
struct StubModel {
    cache_capacity: Option<usize>,
    cached: usize,
    calls: Vec<(Vec<u32>, Vec<usize>)>,
    force_at: Option<(usize, u32)>,
    fail_at: Option<usize>,
}

impl StubModel {
    fn new() -> Self {
        Self {
            cache_capacity: None,
            cached: 0,
            calls: Vec::new(),
            force_at: None,
            fail_at: None,
        }
    }

    fn successor(token: u32) -> u32 {
        (3 * token + 1) % VOCAB as u32
    }
}

impl LanguageModel for StubModel {
    fn forward(&mut self, tokens: &[u32], positions: &[usize]) -> ModelResult<Vec<f32>> {
        self.calls.push((tokens.to_vec(), positions.to_vec()));
        let call = self.calls.len();
        if self.fail_at == Some(call) {
            return Err(ModelError::Other("device lost".to_string()));
        }

        let capacity = self.cache_capacity.ok_or(ModelError::CacheNotInitialized)?;
        for &pos in positions {
            if pos >= capacity {
                return Err(ModelError::PositionOutOfRange { pos, capacity });
            }
            if pos != self.cached {
                return Err(ModelError::NonContiguousPosition {
                    pos,
                    filled: self.cached,
                });
            }
            self.cached += 1;
        }

        let last = *tokens.last().ok_or(ModelError::EmptyInput)?;
        let favored = match self.force_at {
            Some((at, token)) if at == call => token,
            _ => Self::successor(last),
        };
        let mut logits: Vec<f32> = (0..VOCAB).map(|i| (i % 7) as f32 * 0.1).collect();
        logits[favored as usize] = 50.0;
        Ok(logits)
    }

    fn setup_cache(&mut self, max_sequences: usize, max_length: usize) -> ModelResult<()> {
        assert_eq!(max_sequences, 1);
        self.cache_capacity = Some(max_length);
        self.cached = 0;
        Ok(())
    }

    fn reset_cache(&mut self) {
        self.cached = 0;
    }

    fn max_context_len(&self) -> usize {
        256
    }

    fn vocab_size(&self) -> usize {
        VOCAB
    }
}

fn top1(max_new_tokens: usize, eos_id: Option<u32>) -> GenerateOptions {
    GenerateOptions {
        max_new_tokens,
        max_seq_length: None,
        sampling: SamplingParams {
            temperature: 0.8,
            top_k: Some(1),
            seed: 1234,
            selector: Selector::Random,
        },
        eos_id,
    }
}

#[test]
fn test_prompt_then_argmax_chain() {
    let mut model = StubModel::new();
    let out = generate(&mut model, &[5, 8, 2], &top1(4, None)).unwrap();

    assert_eq!(out.len(), 7);
    assert_eq!(&out[..3], &[5, 8, 2]);
    let mut expected = 2;
    for &t in &out[3..] {
        expected = StubModel::successor(expected);
        assert_eq!(t, expected);
    }
}

#[test]
fn test_eos_at_third_generated_token() {
    let mut model = StubModel::new();
    model.force_at = Some((3, 99));
    let out = generate(&mut model, &[5, 8, 2], &top1(10, Some(99))).unwrap();

    assert_eq!(out.len(), 6);
    assert_eq!(out[out.len() - 1], 99);
    assert_eq!(out.iter().filter(|&&t| t == 99).count(), 1);
    assert_eq!(model.calls.len(), 3);
}

#[test]
fn test_eos_never_drawn_fills_every_slot() {
    let mut model = StubModel::new();
    // successor chain from 2 never reaches 0 within 6 steps
    let out = generate(&mut model, &[5, 8, 2], &top1(6, Some(0))).unwrap();
    assert_eq!(out.len(), 9);
    assert!(!out[3..].contains(&0));
}

#[test]
fn test_positions_track_buffer_cursor() {
    let mut model = StubModel::new();
    let prompt = [7u32, 1, 4, 9];
    let out = generate(&mut model, &prompt, &top1(5, None)).unwrap();

    assert_eq!(model.calls[0], (prompt.to_vec(), vec![0, 1, 2, 3]));
    for (step, (tokens, positions)) in model.calls.iter().enumerate().skip(1) {
        let pos = prompt.len() + step - 1;
        assert_eq!(positions, &vec![pos]);
        // Each decode feeds exactly the token written at its own position.
        assert_eq!(tokens, &vec![out[pos]]);
    }
    assert_eq!(model.calls.len(), 5);
}

#[test]
fn test_model_failure_aborts_without_retry() {
    let mut model = StubModel::new();
    model.fail_at = Some(3);
    let err = generate(&mut model, &[1, 2], &top1(8, None)).unwrap_err();
    assert_eq!(
        err,
        GenerateError::Model(ModelError::Other("device lost".to_string()))
    );
    assert_eq!(model.calls.len(), 3);
}

#[test]
fn test_length_bounds_hold() {
    let config = LlamaConfig::new(16, 2, 1, 1, 24, 64).unwrap();
    let mut model = LlamaModel::random(config, 3);
    let prompt = [72u32, 101, 108, 108, 111];

    for seed in 0..6 {
        for &eos in &[None, Some(101), Some(32)] {
            let opts = GenerateOptions {
                max_new_tokens: 12,
                max_seq_length: None,
                sampling: SamplingParams {
                    temperature: 1.5,
                    top_k: None,
                    seed,
                    selector: Selector::Random,
                },
                eos_id: eos,
            };
            let out = generate(&mut model, &prompt, &opts).unwrap();
            model.reset_cache();

            assert!(out.len() > prompt.len() && out.len() <= prompt.len() + 12);
            assert_eq!(&out[..prompt.len()], &prompt);
            match eos {
                Some(e) if out[prompt.len()..].contains(&e) => {
                    assert_eq!(out[out.len() - 1], e);
                    assert_eq!(out[prompt.len()..].iter().filter(|&&t| t == e).count(), 1);
                }
                _ => assert_eq!(out.len(), prompt.len() + 12),
            }
        }
    }
}

#[test]
fn test_fixed_seed_is_deterministic() {
    let config = LlamaConfig::new(16, 2, 1, 1, 24, 64).unwrap();
    let opts = GenerateOptions {
        max_new_tokens: 10,
        sampling: SamplingParams {
            temperature: 0.9,
            top_k: Some(40),
            seed: 77,
            selector: Selector::Random,
        },
        ..GenerateOptions::default()
    };

    let mut a = LlamaModel::random(config.clone(), 11);
    let mut b = LlamaModel::random(config, 11);
    let out_a = generate(&mut a, &[1, 2, 3], &opts).unwrap();
    let out_b = generate(&mut b, &[1, 2, 3], &opts).unwrap();
    assert_eq!(out_a, out_b);

    // Same model instance after a reset.
    a.reset_cache();
    assert_eq!(generate(&mut a, &[1, 2, 3], &opts).unwrap(), out_a);
}

#[test]
fn test_greedy_repeats_exactly_across_resets() {
    let mut model = LlamaModel::from_name("tiny", 5).unwrap();
    let opts = GenerateOptions {
        max_new_tokens: 8,
        sampling: SamplingParams::greedy(),
        ..GenerateOptions::default()
    };
    let mut generator = Generator::new(opts, model.vocab_size()).unwrap();
    let first = generator.generate(&mut model, &[256, 72, 105]).unwrap();
    model.reset_cache();
    let second = generator.generate(&mut model, &[256, 72, 105]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_reset_sampler_replays_generation() {
    let mut model = StubModel::new();
    let opts = GenerateOptions {
        max_new_tokens: 6,
        sampling: SamplingParams {
            temperature: 50.0,
            top_k: None,
            seed: 9,
            selector: Selector::Random,
        },
        ..GenerateOptions::default()
    };
    let mut generator = Generator::new(opts, VOCAB).unwrap();
    let first = generator.generate(&mut model, &[1]).unwrap();
    model.reset_cache();

    generator.reset_sampler();
    let replay = generator.generate(&mut model, &[1]).unwrap();
    assert_eq!(first, replay);
}

#[test]
fn test_timed_executor_counts_decode_steps() {
    let mut model = StubModel::new();
    let mut generator =
        Generator::with_executor(TimedStep::new(EagerStep), top1(5, None), VOCAB).unwrap();
    generator.generate(&mut model, &[3, 3]).unwrap();
    let timings = generator.executor().timings();
    assert_eq!(timings.decode_steps, 4);
}

#[test]
fn test_cache_overflow_is_reported_up_front() {
    let mut model = StubModel::new();
    let opts = GenerateOptions {
        max_seq_length: Some(4),
        ..top1(5, None)
    };
    assert_eq!(
        generate(&mut model, &[1, 2], &opts),
        Err(GenerateError::CacheCapacity {
            required: 6,
            available: 4
        })
    );
    assert!(model.calls.is_empty());
}
