//! `gen-core` - autoregressive token generation.
//!
//! A prompt is run through the model once (prefill), then each sampled
//! token is fed back one position at a time (decode) until `max_new_tokens`
//! have been produced or the EOS token is drawn.
//!
//! - [`TokenBuffer`]: the pre-allocated output sequence and its write cursor
//! - [`StepExecutor`]: how a single prefill/decode step is run
//! - [`Generator`]: the loop, configured once and reusable across prompts

pub mod buffer;
pub mod error;
pub mod generate;
pub mod step;

pub use buffer::TokenBuffer;
pub use error::{GenerateError, Result};
pub use generate::{generate, GenerateOptions, Generator};
pub use step::{EagerStep, StepExecutor, StepTimings, TimedStep};
