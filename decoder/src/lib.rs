mod chunk;
mod render;
mod sources;

use structures::{Pixel, HEIGHT, WIDTH};

pub use crate::chunk::{Chunk, ChunkKind, Chunks};
pub use crate::render::chunk_kind_color;
pub use crate::sources::{DecodeReport, PixelSources, StreamAnomaly};

/// Fills the tail of a short stream.
pub const PADDING: Pixel = Pixel::new(128, 0, 128, 255);

/// How many pixels a single stream may produce, as a multiple of the canvas
/// area, before decoding gives up on the rest of the input.
pub const OVERRUN_FACTOR: usize = 3;

/// Channel profile of the stream.
///
/// Both profiles share one decoding path. `Rgba` seeds the cache with
/// transparent black and starts from opaque black; `Rgb` pins alpha at 255
/// everywhere, ignoring the alpha byte of RGBA chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channels {
    Rgb,
    #[default]
    Rgba,
}

impl Channels {
    pub(crate) fn cache_seed(self) -> Pixel {
        match self {
            Channels::Rgb => Pixel::new(0, 0, 0, 255),
            Channels::Rgba => Pixel::new(0, 0, 0, 0),
        }
    }

    pub(crate) fn initial_last(self) -> Pixel {
        Pixel::new(0, 0, 0, 255)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(WIDTH, HEIGHT)
    }
}

impl Decoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channels: Channels::default(),
        }
    }

    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn chunks<'a>(&self, body: &'a [u8]) -> Chunks<'a> {
        Chunks::new(body, self.channels, OVERRUN_FACTOR * self.area())
    }

    /// For every output pixel, the chunk that produced it (`None` for padding).
    pub fn sources<'a>(&self, body: &'a [u8]) -> PixelSources<'a> {
        PixelSources::new(self.chunks(body), self.area())
    }

    /// Exactly `width * height` pixels.
    pub fn pixels<'a>(&self, body: &'a [u8]) -> impl ExactSizeIterator<Item = Pixel> + 'a {
        self.sources(body)
            .map(|chunk| chunk.map_or(PADDING, |chunk| chunk.pixel))
    }

    /// Offset of the chunk controlling each pixel, so a pixel can be changed
    /// by writing at that offset. Padding pixels have no controlling offset.
    pub fn offsets<'a>(&self, body: &'a [u8]) -> impl ExactSizeIterator<Item = Option<usize>> + 'a {
        self.sources(body).map(|chunk| chunk.map(|chunk| chunk.offset))
    }

    /// Controlling offset of the pixel at (x, y).
    pub fn locate(&self, body: &[u8], x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.offsets(body).nth(index).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Decoder {
        Decoder::new(4, 4)
    }

    #[test]
    fn all_zero_body_is_transparent_black() {
        let decoder = Decoder::default();
        let body = vec![0u8; structures::BUFFER_LEN];

        let pixels: Vec<Pixel> = decoder.pixels(&body).collect();

        assert_eq!(pixels.len(), 512 * 512);
        assert!(pixels.iter().all(|p| *p == Pixel::new(0, 0, 0, 0)));
    }

    #[test]
    fn rgb_profile_all_zero_body_is_opaque_black() {
        let decoder = small().with_channels(Channels::Rgb);

        assert!(decoder
            .pixels(&[0; 16])
            .all(|p| p == Pixel::new(0, 0, 0, 255)));
    }

    #[test]
    fn maximal_runs_stay_within_canvas() {
        let decoder = Decoder::default();
        let body = vec![0xfd; structures::BUFFER_LEN];

        let mut sources = decoder.sources(&body);
        let count = sources.by_ref().count();
        let report = sources.finish();

        assert_eq!(count, 512 * 512);
        assert!(report.capped);
        assert_eq!(report.produced, 3 * 512 * 512);
        assert!(matches!(report.anomaly(), Some(StreamAnomaly::Overrun { .. })));
    }

    #[test]
    fn truncated_body_is_padded() {
        let decoder = small();

        let pixels: Vec<Pixel> = decoder.pixels(&[0xfe, 1, 2, 3, 0xc1]).collect();

        assert_eq!(pixels.len(), 16);
        assert!(pixels[..3].iter().all(|p| *p == Pixel::new(1, 2, 3, 255)));
        assert!(pixels[3..].iter().all(|p| *p == PADDING));
    }

    #[test]
    fn offsets_point_at_chunk_starts() {
        let decoder = small();
        let mut body = Vec::new();
        for i in 0..5u8 {
            body.extend_from_slice(&[0xfe, i, i, i]);
        }

        let offsets: Vec<Option<usize>> = decoder.offsets(&body).collect();

        for (i, offset) in offsets.iter().take(5).enumerate() {
            assert_eq!(*offset, Some(4 * i));
        }
        assert!(offsets[5..].iter().all(|o| o.is_none()));
    }

    #[test]
    fn run_pixels_share_the_run_offset() {
        let decoder = small();

        let offsets: Vec<Option<usize>> = decoder.offsets(&[0x40, 0xc2, 0x55]).collect();

        assert_eq!(&offsets[..5], &[Some(0), Some(1), Some(1), Some(1), Some(2)]);
    }

    #[test]
    fn locate_maps_coordinates_row_major() {
        let decoder = small();
        let body: Vec<u8> = (0..16).map(|_| 0x40).collect();

        assert_eq!(decoder.locate(&body, 1, 2), Some(9));
        assert_eq!(decoder.locate(&body, 4, 0), None);
        assert_eq!(decoder.locate(&[0x40], 3, 3), None);
    }
}
