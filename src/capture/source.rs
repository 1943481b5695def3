use std::collections::VecDeque;
use std::fs::File;
use std::path::PathBuf;

use crate::buffer::InputBuffer;
use crate::error::{HarnessError, Result};

/// Where a capture run pulls its inputs from.
pub trait InputSource {
    /// Loads the next input into `buffer`. `Ok(false)` means the source is
    /// exhausted and the run should finish cleanly.
    fn next_input(&mut self, buffer: &mut InputBuffer) -> Result<bool>;
}

/// Re-reads one path every iteration. The external fuzzing loop rewrites
/// the file between iterations, so this source never runs dry by itself.
#[derive(Debug, Clone)]
pub struct FileInput {
    path: PathBuf,
}

impl FileInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InputSource for FileInput {
    fn next_input(&mut self, buffer: &mut InputBuffer) -> Result<bool> {
        let violation = |source| HarnessError::Input {
            path: self.path.clone(),
            source,
        };
        let mut file = File::open(&self.path).map_err(violation)?;
        buffer.fill_from(&mut file).map_err(violation)?;
        Ok(true)
    }
}

/// Inputs held in memory, consumed front to back.
#[derive(Debug, Clone, Default)]
pub struct MemoryInput {
    pending: VecDeque<Vec<u8>>,
}

impl MemoryInput {
    pub fn new<I, B>(inputs: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self {
            pending: inputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits `data` into `[u16 BE length][bytes]` frames. A short or
    /// overlong trailing frame keeps whatever bytes remain.
    pub fn from_length_prefixed(data: &[u8]) -> Self {
        let mut pending = VecDeque::new();
        let mut rest = data;
        while rest.len() >= 2 {
            let len = usize::from(u16::from_be_bytes([rest[0], rest[1]]));
            let body = &rest[2..];
            let take = len.min(body.len());
            pending.push_back(body[..take].to_vec());
            rest = &body[take..];
        }
        Self { pending }
    }

    pub fn push(&mut self, input: impl Into<Vec<u8>>) {
        self.pending.push_back(input.into());
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl InputSource for MemoryInput {
    fn next_input(&mut self, buffer: &mut InputBuffer) -> Result<bool> {
        match self.pending.pop_front() {
            Some(input) => {
                buffer.fill_from_slice(&input);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
