//! Incremental decoder for `text/event-stream` bodies.
//!
//! Only the `data` field matters here; `event`, `id`, `retry` and comment lines
//! are ignored. Chunks may split lines (or UTF-8 sequences) anywhere.
//! Lines longer than the limit are discarded up to their terminating newline,
//! together with the event they belong to.

/// Status frames are a few hundred bytes; anything near this is not one.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Accumulates raw bytes and yields one payload per dispatched event.
#[derive(Debug)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
    max_line: usize,
    /// Skipping the rest of an oversized line.
    overflow: bool,
    /// The pending event lost a line and must not be dispatched.
    event_dropped: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            line: Vec::new(),
            data: Vec::new(),
            max_line: max_line.max(1),
            overflow: false,
            event_dropped: false,
        }
    }

    /// Feed a chunk; returns the payloads of all events completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                if std::mem::take(&mut self.overflow) {
                    continue;
                }
                let mut line = std::mem::take(&mut self.line);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if let Some(payload) = self.process_line(&line) {
                    events.push(payload);
                }
            } else if self.overflow {
                continue;
            } else if self.line.len() >= self.max_line {
                tracing::warn!(limit = self.max_line, "dropping oversized stream line");
                self.line = Vec::new();
                self.overflow = true;
                self.event_dropped = true;
            } else {
                self.line.push(byte);
            }
        }
        events
    }

    fn process_line(&mut self, line: &[u8]) -> Option<String> {
        if line.is_empty() {
            let data = std::mem::take(&mut self.data);
            if std::mem::take(&mut self.event_dropped) || data.is_empty() {
                return None;
            }
            return Some(data.join("\n"));
        }
        if line[0] == b':' {
            return None;
        }
        let line = String::from_utf8_lossy(line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}
