//! Incremental splitting of provider `text/event-stream` bodies.

/// Buffers raw body bytes and yields complete SSE event blocks.
///
/// Blocks are separated by a blank line. Bytes are kept undecoded until a
/// full block is available so multi-byte characters split across network
/// chunks survive intact.
#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a network chunk.
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().filter(|b| **b != b'\r'));
    }

    /// Take the next complete event block, if one is buffered.
    pub(crate) fn next_event(&mut self) -> Option<String> {
        let pos = self.buf.windows(2).position(|w| w == b"\n\n")?;
        let block: Vec<u8> = self.buf.drain(..pos + 2).collect();
        Some(String::from_utf8_lossy(&block[..pos]).into_owned())
    }
}

/// A parsed SSE block: the optional `event:` name and joined `data:` lines.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SseEvent<'a> {
    pub event: Option<&'a str>,
    pub data: Option<String>,
}

pub(crate) fn parse_event(block: &str) -> SseEvent<'_> {
    let mut event = None;
    let mut data: Option<String> = None;

    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            match data.as_mut() {
                Some(d) => {
                    d.push('\n');
                    d.push_str(rest);
                }
                None => data = Some(rest.to_string()),
            }
        }
    }

    SseEvent { event, data }
}
