use structures::Pixel;

use crate::Channels;

const CACHE_SIZE: usize = 64;

const OP_RGB: u8 = 0xfe;
const OP_RGBA: u8 = 0xff;
const MASK_2: u8 = 0xc0;
const OP_INDEX: u8 = 0x00;
const OP_DIFF: u8 = 0x40;
const OP_LUMA: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    Rgb,
    Rgba,
    Index,
    Diff,
    Luma,
    Run,
}

/// One decoded chunk: where it started in the body and what it expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub offset: usize,
    pub pixel: Pixel,
    pub count: usize,
}

fn cache_index(pixel: Pixel) -> usize {
    (pixel.r as usize * 3 + pixel.g as usize * 5 + pixel.b as usize * 7 + pixel.a as usize * 11)
        % CACHE_SIZE
}

/// Walks a body chunk by chunk.
///
/// Reads past the end of the body see zero bytes. Iteration ends once the body
/// is exhausted or once `cap` pixels have been produced, whichever comes first.
/// A run that would cross the cap is cut short, so `produced` never exceeds it.
pub struct Chunks<'a> {
    data: &'a [u8],
    pos: usize,
    channels: Channels,
    cache: [Pixel; CACHE_SIZE],
    last: Pixel,
    produced: usize,
    cap: usize,
    capped: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(data: &'a [u8], channels: Channels, cap: usize) -> Self {
        Self {
            data,
            pos: 0,
            channels,
            cache: [channels.cache_seed(); CACHE_SIZE],
            last: channels.initial_last(),
            produced: 0,
            cap,
            capped: false,
        }
    }

    /// Pixels produced so far, counting every repetition of a run.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Whether decoding stopped at the cap with input left over.
    pub fn capped(&self) -> bool {
        self.capped
    }

    fn read_byte(&mut self) -> u8 {
        match self.data.get(self.pos) {
            Some(byte) => {
                self.pos += 1;
                *byte
            }
            None => 0,
        }
    }

    fn see(&mut self, pixel: Pixel) {
        self.last = pixel;
        self.cache[cache_index(pixel)] = pixel;
    }

    fn decode(&mut self, tag: u8) -> (ChunkKind, Pixel, usize) {
        let last = self.last;

        if tag == OP_RGB {
            let (r, g, b) = (self.read_byte(), self.read_byte(), self.read_byte());
            return (ChunkKind::Rgb, Pixel::new(r, g, b, last.a), 1);
        }

        if tag == OP_RGBA {
            let (r, g, b) = (self.read_byte(), self.read_byte(), self.read_byte());
            let a = self.read_byte();
            let a = match self.channels {
                Channels::Rgba => a,
                Channels::Rgb => last.a,
            };
            return (ChunkKind::Rgba, Pixel::new(r, g, b, a), 1);
        }

        match tag & MASK_2 {
            OP_INDEX => (ChunkKind::Index, self.cache[(tag & 0x3f) as usize], 1),
            OP_DIFF => {
                let dr = ((tag >> 4) & 0x03) as i16 - 2;
                let dg = ((tag >> 2) & 0x03) as i16 - 2;
                let db = (tag & 0x03) as i16 - 2;
                (ChunkKind::Diff, shift(last, dr, dg, db), 1)
            }
            OP_LUMA => {
                let dg = (tag & 0x3f) as i16 - 32;
                let nibbles = self.read_byte();
                let dr = ((nibbles >> 4) & 0x0f) as i16 - 8 + dg;
                let db = (nibbles & 0x0f) as i16 - 8 + dg;
                (ChunkKind::Luma, shift(last, dr, dg, db), 1)
            }
            // 0xfe and 0xff are handled above, so the run length tops out at 62
            _ => (ChunkKind::Run, last, (tag & 0x3f) as usize + 1),
        }
    }
}

fn shift(pixel: Pixel, dr: i16, dg: i16, db: i16) -> Pixel {
    Pixel::new(
        pixel.r.wrapping_add(dr as u8),
        pixel.g.wrapping_add(dg as u8),
        pixel.b.wrapping_add(db as u8),
        pixel.a,
    )
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() || self.capped {
            return None;
        }
        if self.produced >= self.cap {
            self.capped = true;
            return None;
        }

        let offset = self.pos;
        let tag = self.read_byte();
        let (kind, pixel, mut count) = self.decode(tag);

        if kind != ChunkKind::Run {
            self.see(pixel);
        }

        let room = self.cap - self.produced;
        if count > room {
            count = room;
            self.capped = true;
        }
        self.produced += count;

        Some(Chunk {
            kind,
            offset,
            pixel,
            count,
        })
    }
}
