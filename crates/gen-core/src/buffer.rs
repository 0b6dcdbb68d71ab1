use crate::error::{GenerateError, Result};

/// Fixed-capacity output sequence with an explicit write cursor.
///
/// Allocated once for `prompt + max_new_tokens` tokens. Slots are written
/// exactly once, in order; nothing past the cursor is readable.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    tokens: Vec<u32>,
    capacity: usize,
}

impl TokenBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Allocate `capacity` slots and copy `prompt` into the front.
    pub fn from_prompt(prompt: &[u32], capacity: usize) -> Result<Self> {
        if prompt.len() > capacity {
            return Err(GenerateError::BufferFull { capacity });
        }
        let mut buffer = Self::with_capacity(capacity);
        buffer.tokens.extend_from_slice(prompt);
        Ok(buffer)
    }

    /// Write `token` at the cursor and advance it.
    pub fn push(&mut self, token: u32) -> Result<()> {
        if self.tokens.len() == self.capacity {
            return Err(GenerateError::BufferFull {
                capacity: self.capacity,
            });
        }
        self.tokens.push(token);
        Ok(())
    }

    /// Index of the next slot to be written.
    pub fn cursor(&self) -> usize {
        self.tokens.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.tokens.len() == self.capacity
    }

    /// Most recently written token.
    pub fn last(&self) -> Option<u32> {
        self.tokens.last().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.tokens
    }

    /// The written prefix `[0, cursor)`.
    pub fn into_tokens(self) -> Vec<u32> {
        self.tokens
    }
}
