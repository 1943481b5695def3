use std::io::{self, ErrorKind, Read};

/// Largest input the harness will record or decode. Anything past this is
/// discarded before either happens.
pub const MAX_INPUT_SIZE: usize = 65536;

/// Fixed-capacity input region shared by recording and decoding.
///
/// Both paths read the same `as_slice()`, so truncation can never differ
/// between what lands on disk and what the decoder receives.
#[derive(Debug)]
pub struct InputBuffer {
    data: Box<[u8]>,
    len: usize,
    truncated: bool,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_INPUT_SIZE)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
            truncated: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// True when the last fill saw more bytes than fit.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.truncated = false;
    }

    /// Replaces the contents with at most `capacity()` bytes from `reader`.
    pub fn fill_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.clear();
        while self.len < self.data.len() {
            match reader.read(&mut self.data[self.len..]) {
                Ok(0) => return Ok(self.len),
                Ok(n) => self.len += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }

        // Full buffer: probe one byte so truncation is observable.
        let mut probe = [0u8; 1];
        loop {
            match reader.read(&mut probe) {
                Ok(0) => break,
                Ok(_) => {
                    self.truncated = true;
                    break;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(self.len)
    }

    /// Replaces the contents with the first `capacity()` bytes of `bytes`.
    pub fn fill_from_slice(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.data.len());
        self.data[..n].copy_from_slice(&bytes[..n]);
        self.len = n;
        self.truncated = bytes.len() > n;
        n
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
