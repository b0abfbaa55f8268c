use super::{ByteSource, SourceError, SourceRead};

/// In-memory source delivering fixed-size chunks.
///
/// `idle_every` inserts an `Idle` result between chunks, which makes
/// timeout handling reproducible in tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    position: usize,
    chunk: usize,
    idle_every: Option<usize>,
    reads: usize,
}

impl MemorySource {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            data,
            position: 0,
            chunk: chunk.max(1),
            idle_every: None,
            reads: 0,
        }
    }

    pub fn with_idle_every(mut self, reads: usize) -> Self {
        self.idle_every = Some(reads.max(1));
        self
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl ByteSource for MemorySource {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<SourceRead, SourceError> {
        self.reads += 1;
        if self
            .idle_every
            .is_some_and(|every| self.reads % (every + 1) == 0)
        {
            return Ok(SourceRead::Idle);
        }
        if self.position >= self.data.len() {
            return Ok(SourceRead::Closed);
        }
        let n = self.chunk.min(buf.len()).min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(SourceRead::Data(n))
    }

    fn describe(&self) -> String {
        format!("memory ({} bytes)", self.data.len())
    }
}
