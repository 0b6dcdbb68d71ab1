//! `gen-sampler` - turns a logits vector into one token id.
//!
//! Sampling is a pipeline of [`Sampler`] stages run by a [`SamplerChain`]:
//! filters (temperature scaling, top-k truncation) reshape the candidate
//! list, and a final selector (arg-max or a seeded weighted draw) leaves
//! exactly one candidate behind.

pub mod error;
pub mod greedy;
pub mod params;
pub mod sampler;
pub mod temperature;
pub mod top_k;

pub use error::{Result, SamplerError};
pub use greedy::{softmax, DistSampler, GreedySampler};
pub use params::{SamplingParams, Selector};
pub use sampler::{Sampler, SamplerChain, TokenLogit};
pub use temperature::TemperatureSampler;
pub use top_k::TopKSampler;
