//! Text token reading and writing for the Battle Noodles wire format.
//!
//! Frames are space-delimited ASCII with no trailing newline. Floats are
//! printed with two decimals.

use bytes::{BufMut, Bytes, BytesMut};

use crate::ProtocolError;

/// A reader that consumes a frame token by token.
#[derive(Debug)]
pub struct TokenReader<'a> {
    tokens: std::str::SplitAsciiWhitespace<'a>,
}

impl<'a> TokenReader<'a> {
    /// Create a new reader over a frame.
    pub fn new(frame: &'a str) -> Self {
        Self {
            tokens: frame.split_ascii_whitespace(),
        }
    }

    /// Next raw token, or `UnexpectedEnd` if the frame is exhausted.
    pub fn get_token(&mut self) -> Result<&'a str, ProtocolError> {
        self.tokens.next().ok_or(ProtocolError::UnexpectedEnd)
    }

    /// Next token if any.
    pub fn try_get_token(&mut self) -> Option<&'a str> {
        self.tokens.next()
    }

    #[inline]
    pub fn get_u8(&mut self) -> Result<u8, ProtocolError> {
        self.parse()
    }

    #[inline]
    pub fn get_u32(&mut self) -> Result<u32, ProtocolError> {
        self.parse()
    }

    #[inline]
    pub fn get_usize(&mut self) -> Result<usize, ProtocolError> {
        self.parse()
    }

    #[inline]
    pub fn get_f32(&mut self) -> Result<f32, ProtocolError> {
        self.parse()
    }

    /// Boolean flag: any integer token, nonzero means set.
    pub fn get_flag(&mut self) -> Result<bool, ProtocolError> {
        let v: i32 = self.parse()?;
        Ok(v != 0)
    }

    fn parse<T: std::str::FromStr>(&mut self) -> Result<T, ProtocolError> {
        let token = self.get_token()?;
        token
            .parse()
            .map_err(|_| ProtocolError::InvalidNumber(token.to_owned()))
    }
}

/// A writer that builds a frame token by token.
#[derive(Debug, Default)]
pub struct TextWriter {
    buf: BytesMut,
}

impl TextWriter {
    /// Create a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a new writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a raw token, inserting the separating space as needed.
    pub fn put_token(&mut self, token: &str) {
        if !self.buf.is_empty() {
            self.buf.put_u8(b' ');
        }
        self.buf.put_slice(token.as_bytes());
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) {
        self.put_token(&v.to_string());
    }

    #[inline]
    pub fn put_u32(&mut self, v: u32) {
        self.put_token(&v.to_string());
    }

    #[inline]
    pub fn put_usize(&mut self, v: usize) {
        self.put_token(&v.to_string());
    }

    /// Floats carry two decimals on the wire.
    pub fn put_f32(&mut self, v: f32) {
        self.put_token(&format!("{v:.2}"));
    }

    /// Boolean flag as `0`/`1`.
    pub fn put_flag(&mut self, v: bool) {
        self.put_token(if v { "1" } else { "0" });
    }

    /// Consume the writer and return the built frame.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Current frame contents as a str (always ASCII).
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf).unwrap_or_default()
    }
}
