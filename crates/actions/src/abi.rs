//! Static ABI tuple encoding.
//!
//! Every field occupies one 32-byte big-endian word. Only the static types
//! used by Core actions are supported: `address`, `uint32`, `uint64` and
//! `bool`. Unused high bytes must be zero.

use crate::DecodeError;
use hypercore_types::Address;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// Appends ABI words to a buffer.
#[derive(Debug, Default)]
pub struct AbiWriter {
    buf: Vec<u8>,
}

impl AbiWriter {
    /// Create a writer with room for `words` fields.
    pub fn with_words(words: usize) -> Self {
        Self {
            buf: Vec::with_capacity(words * WORD),
        }
    }

    fn push_right_aligned(&mut self, bytes: &[u8]) {
        let padding = WORD - bytes.len();
        self.buf.extend(std::iter::repeat(0u8).take(padding));
        self.buf.extend_from_slice(bytes);
    }

    pub fn address(mut self, value: &Address) -> Self {
        self.push_right_aligned(value.as_bytes());
        self
    }

    pub fn uint64(mut self, value: u64) -> Self {
        self.push_right_aligned(&value.to_be_bytes());
        self
    }

    pub fn uint32(mut self, value: u32) -> Self {
        self.push_right_aligned(&value.to_be_bytes());
        self
    }

    pub fn bool(mut self, value: bool) -> Self {
        self.push_right_aligned(&[value as u8]);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads ABI words from a payload of known arity.
#[derive(Debug)]
pub struct AbiReader<'a> {
    payload: &'a [u8],
    field: usize,
}

impl<'a> AbiReader<'a> {
    /// Create a reader, checking the payload holds exactly `words` fields.
    pub fn new(payload: &'a [u8], words: usize) -> Result<Self, DecodeError> {
        if payload.len() != words * WORD {
            return Err(DecodeError::PayloadLength {
                expected: words * WORD,
                actual: payload.len(),
            });
        }
        Ok(Self { payload, field: 0 })
    }

    /// Take the next word, returning the high (padding) part and the low
    /// `width` bytes.
    fn next_word(&mut self, width: usize) -> (usize, &'a [u8], &'a [u8]) {
        let field = self.field;
        let word = &self.payload[field * WORD..(field + 1) * WORD];
        self.field += 1;
        let (high, low) = word.split_at(WORD - width);
        (field, high, low)
    }

    fn is_zero(bytes: &[u8]) -> bool {
        bytes.iter().all(|&b| b == 0)
    }

    pub fn address(&mut self) -> Result<Address, DecodeError> {
        let (field, high, low) = self.next_word(Address::BYTES);
        if !Self::is_zero(high) {
            return Err(DecodeError::InvalidAddress { field });
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(low);
        Ok(Address::from_bytes(bytes))
    }

    pub fn uint64(&mut self) -> Result<u64, DecodeError> {
        let (field, high, low) = self.next_word(8);
        if !Self::is_zero(high) {
            return Err(DecodeError::IntegerOverflow { field, bits: 64 });
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(low);
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn uint32(&mut self) -> Result<u32, DecodeError> {
        let (field, high, low) = self.next_word(4);
        if !Self::is_zero(high) {
            return Err(DecodeError::IntegerOverflow { field, bits: 32 });
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(low);
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        let (field, high, low) = self.next_word(1);
        match (Self::is_zero(high), low[0]) {
            (true, 0) => Ok(false),
            (true, 1) => Ok(true),
            _ => Err(DecodeError::InvalidBool { field }),
        }
    }
}
