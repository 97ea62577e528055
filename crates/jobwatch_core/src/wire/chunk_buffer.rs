use encoding_rs::{CoderResult, Decoder, UTF_8};
use watch_logging::watch_wire;

use super::DATA_PREFIX;

/// Turns arbitrarily split byte chunks into complete `data: ` lines.
///
/// Decoding is incremental: a UTF-8 sequence cut by a chunk boundary is held
/// inside the decoder until the rest of it arrives. The last, unterminated line
/// is kept in `pending` until a later chunk completes it.
pub struct ChunkBuffer {
    decoder: Decoder,
    pending: String,
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChunkBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkBuffer")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            pending: String::new(),
        }
    }

    /// Feed one chunk; returns every frame line completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode_into_pending(chunk, false);
        self.drain_complete_lines()
    }

    /// Flush the decoder at end of stream.
    ///
    /// Returns the unterminated remainder, if any. It is never parsed: a
    /// non-empty remainder means the stream stopped in the middle of a line.
    /// The buffer is reset and can be reused afterwards.
    pub fn finish(&mut self) -> Option<String> {
        self.decode_into_pending(&[], true);
        self.decoder = UTF_8.new_decoder_with_bom_removal();
        let leftover = std::mem::take(&mut self.pending);
        if leftover.trim().is_empty() {
            None
        } else {
            Some(leftover)
        }
    }

    /// Number of buffered characters not yet terminated by a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn decode_into_pending(&mut self, mut input: &[u8], last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() + 4);
            self.pending.reserve(needed);
            let (result, read, had_replacements) =
                self.decoder
                    .decode_to_string(input, &mut self.pending, last);
            if had_replacements {
                watch_wire!("invalid UTF-8 in stream replaced with U+FFFD");
            }
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| line.starts_with(DATA_PREFIX))
            .map(ToOwned::to_owned)
            .collect()
    }
}
