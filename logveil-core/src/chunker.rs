//! Character-counted chunking of input text.
//!
//! Chunks are borrowed slices cut on `char` boundaries, so a chunk of `n` characters may
//! span more than `n` bytes when the text contains multi-byte characters.

use std::num::NonZeroUsize;

/// Iterator over consecutive chunks of at most `max_chars` characters.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: NonZeroUsize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .char_indices()
            .nth(self.max_chars.get())
            .map_or(self.rest.len(), |(index, _)| index);
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// Splits `text` into chunks of at most `max_chars` characters, in order.
///
/// The empty string yields no chunks. The last chunk may be shorter than `max_chars`.
pub fn split_chunks(text: &str, max_chars: NonZeroUsize) -> Chunks<'_> {
    Chunks {
        rest: text,
        max_chars,
    }
}
