use std::iter::FusedIterator;

use crate::chunk::{Chunk, Chunks};

/// Problems with a stream that decoding papers over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAnomaly {
    /// The body ran out early and `missing` pixels were padded.
    Truncated { missing: usize },
    /// The body described `excess` pixels too many. `capped` is set when
    /// decoding stopped before the end of the body.
    Overrun { excess: usize, capped: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    pub expected: usize,
    pub produced: usize,
    pub capped: bool,
}

impl DecodeReport {
    pub fn anomaly(&self) -> Option<StreamAnomaly> {
        if self.produced < self.expected {
            Some(StreamAnomaly::Truncated {
                missing: self.expected - self.produced,
            })
        } else if self.produced > self.expected {
            Some(StreamAnomaly::Overrun {
                excess: self.produced - self.expected,
                capped: self.capped,
            })
        } else {
            None
        }
    }
}

/// Expands chunks into exactly `total` items, one per output pixel.
///
/// Each item is the chunk that produced the pixel, or `None` once the chunks
/// ran out and the pixel is padding. Chunks beyond `total` pixels are never
/// expanded.
pub struct PixelSources<'a> {
    chunks: Chunks<'a>,
    current: Option<Chunk>,
    left_in_chunk: usize,
    emitted: usize,
    total: usize,
}

impl<'a> PixelSources<'a> {
    pub fn new(chunks: Chunks<'a>, total: usize) -> Self {
        Self {
            chunks,
            current: None,
            left_in_chunk: 0,
            emitted: 0,
            total,
        }
    }

    /// Drains the remaining chunks, bounded by the overrun cap, and reports how
    /// the stream measured up against the canvas.
    pub fn finish(mut self) -> DecodeReport {
        for _ in self.chunks.by_ref() {}

        DecodeReport {
            expected: self.total,
            produced: self.chunks.produced(),
            capped: self.chunks.capped(),
        }
    }
}

impl<'a> Iterator for PixelSources<'a> {
    type Item = Option<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted == self.total {
            return None;
        }
        self.emitted += 1;

        while self.left_in_chunk == 0 {
            match self.chunks.next() {
                Some(chunk) => {
                    self.left_in_chunk = chunk.count;
                    self.current = Some(chunk);
                }
                None => return Some(None),
            }
        }

        self.left_in_chunk -= 1;
        Some(self.current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.emitted;
        (left, Some(left))
    }
}

impl<'a> ExactSizeIterator for PixelSources<'a> {}

impl<'a> FusedIterator for PixelSources<'a> {}
