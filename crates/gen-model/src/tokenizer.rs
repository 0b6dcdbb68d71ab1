/// Text <-> token id conversion.
pub trait Tokenizer {
    /// Encode `text`, optionally wrapping it in BOS/EOS markers.
    fn encode(&self, text: &str, bos: bool, eos: bool) -> Vec<u32>;

    /// Decode token ids back to text. Special tokens are not rendered.
    fn decode(&self, tokens: &[u32]) -> String;

    /// Beginning-of-sequence token ID.
    fn bos_id(&self) -> u32;

    /// End-of-sequence token ID.
    fn eos_id(&self) -> u32;

    /// Number of tokens in the vocabulary.
    fn vocab_size(&self) -> usize;
}

/// Byte-level tokenizer: ids 0..=255 are raw UTF-8 bytes, followed by BOS and EOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteTokenizer;

impl ByteTokenizer {
    pub const BOS_ID: u32 = 256;
    pub const EOS_ID: u32 = 257;
    pub const VOCAB_SIZE: usize = 258;

    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str, bos: bool, eos: bool) -> Vec<u32> {
        let mut ids = Vec::with_capacity(text.len() + 2);
        if bos {
            ids.push(Self::BOS_ID);
        }
        ids.extend(text.bytes().map(u32::from));
        if eos {
            ids.push(Self::EOS_ID);
        }
        ids
    }

    fn decode(&self, tokens: &[u32]) -> String {
        let bytes: Vec<u8> = tokens
            .iter()
            .filter_map(|&t| u8::try_from(t).ok())
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn bos_id(&self) -> u32 {
        Self::BOS_ID
    }

    fn eos_id(&self) -> u32 {
        Self::EOS_ID
    }

    fn vocab_size(&self) -> usize {
        Self::VOCAB_SIZE
    }
}
