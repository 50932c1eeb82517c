//! Incremental `text/event-stream` decoder
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::feed`] buffers partial
//! lines and returns the `data` payload of every frame completed by the
//! chunk. Event names, ids and retry hints are ignored: the feed has no
//! resume cursor and uses its own reconnect delay.

/// Line-oriented SSE frame decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, unterminated line.
    line: Vec<u8>,
    /// `data:` lines of the frame being assembled.
    data: Vec<String>,
    /// The previous chunk ended in `\r`; a leading `\n` belongs to it.
    pending_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk, returning the payloads of completed frames in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => self.end_line(&mut frames),
                b'\r' => {
                    self.pending_cr = true;
                    self.end_line(&mut frames);
                }
                other => self.line.push(other),
            }
        }
        frames
    }

    fn end_line(&mut self, frames: &mut Vec<String>) {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();

        if line.is_empty() {
            if !self.data.is_empty() {
                frames.push(self.data.join("\n"));
                self.data.clear();
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
    }
}
