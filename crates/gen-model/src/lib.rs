pub mod error;
pub mod kv_cache;
pub mod llama;
pub mod model;
pub mod tokenizer;

pub use error::{ModelError, Result};
pub use kv_cache::KvCache;
pub use model::LanguageModel;
pub use tokenizer::{ByteTokenizer, Tokenizer};
