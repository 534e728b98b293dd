use image::{Rgb, RgbImage};
use log::warn;

use crate::{ChunkKind, DecodeReport, Decoder, PADDING};

/// Highlight colour for each kind of chunk. Runs have none and keep the colour
/// they decode to.
pub fn chunk_kind_color(kind: ChunkKind) -> Option<Rgb<u8>> {
    match kind {
        ChunkKind::Rgb => Some(Rgb([255, 0, 0])),
        ChunkKind::Rgba => Some(Rgb([255, 0, 128])),
        ChunkKind::Index => Some(Rgb([0, 255, 0])),
        ChunkKind::Diff => Some(Rgb([0, 255, 255])),
        ChunkKind::Luma => Some(Rgb([255, 128, 0])),
        ChunkKind::Run => None,
    }
}

impl Decoder {
    /// Decodes `body` into an RGB image, dropping alpha.
    pub fn render(&self, body: &[u8]) -> (RgbImage, DecodeReport) {
        let mut canvas = RgbImage::new(self.width, self.height);
        let mut sources = self.sources(body);

        for (out, chunk) in canvas.pixels_mut().zip(sources.by_ref()) {
            *out = Rgb(chunk.map_or(PADDING, |chunk| chunk.pixel).rgb());
        }

        let report = sources.finish();
        log_anomaly(&report);

        (canvas, report)
    }

    /// Like `render`, but each pixel shows which kind of chunk produced it.
    pub fn render_chunk_map(&self, body: &[u8]) -> RgbImage {
        let mut canvas = RgbImage::new(self.width, self.height);

        for (out, chunk) in canvas.pixels_mut().zip(self.sources(body)) {
            *out = match chunk {
                Some(chunk) => {
                    chunk_kind_color(chunk.kind).unwrap_or(Rgb(chunk.pixel.rgb()))
                }
                None => Rgb(PADDING.rgb()),
            };
        }

        canvas
    }
}

fn log_anomaly(report: &DecodeReport) {
    if let Some(anomaly) = report.anomaly() {
        warn!(
            "Expected {} pixels, stream produced {}: {:?}",
            report.expected, report.produced, anomaly
        );
    }
}
