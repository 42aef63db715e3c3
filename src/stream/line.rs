/// Incremental line splitter.
///
/// Bytes are consumed one at a time so a line may span any number of network
/// chunks. Either `\n` or `\r` ends a line; `\r\n` therefore yields an extra
/// empty line, which callers skip anyway.
#[derive(Debug, Default)]
pub struct LineReader {
    buf: Vec<u8>,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                lines.push(self.take());
            } else {
                self.buf.push(byte);
            }
        }
        lines
    }

    /// Whatever is left once the input is exhausted.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    /// Bytes buffered for the current, unterminated line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}
