use decoder::Decoder;
use structures::BUFFER_LEN;

/// Diff chunk of (-2, -2, -2), written right after a painted chunk so the
/// chunk that follows starts at a known offset.
const RESYNC: u8 = 0x40;

/// Bytes that replace the controlling chunk of a pixel.
fn patch(color: [u8; 3]) -> [u8; 5] {
    [0xfe, color[0], color[1], color[2], RESYNC]
}

/// Byte writes that turn the chunk controlling pixel (x, y) into an explicit
/// RGB chunk of `color` followed by a resync byte, skipping bytes that already
/// hold the right value.
///
/// The patch may be longer than the chunk it replaces, shifting every pixel
/// after it, so further pixels have to be planned against the patched body.
pub fn plan_pixel(
    decoder: &Decoder,
    body: &[u8],
    x: u32,
    y: u32,
    color: [u8; 3],
) -> Option<Vec<(usize, u8)>> {
    let start = decoder.locate(body, x, y)?;
    if start + 5 > BUFFER_LEN {
        return None;
    }

    Some(
        patch(color)
            .into_iter()
            .enumerate()
            .map(|(i, value)| (start + i, value))
            .filter(|(offset, value)| body.get(*offset) != Some(value))
            .collect(),
    )
}

/// Plans several pixels in order, relocating each one against the body as
/// patched by the pixels before it. Fails with the first pixel that has no
/// controlling chunk.
pub fn plan_pixels(
    decoder: &Decoder,
    body: &[u8],
    pixels: &[(u32, u32)],
    color: [u8; 3],
) -> Result<Vec<(usize, u8)>, (u32, u32)> {
    let mut scratch = body.to_vec();
    let mut writes = Vec::new();

    for &(x, y) in pixels {
        let planned = plan_pixel(decoder, &scratch, x, y, color).ok_or((x, y))?;
        for &(offset, value) in &planned {
            if scratch.len() <= offset {
                scratch.resize(offset + 1, 0);
            }
            scratch[offset] = value;
        }
        writes.extend(planned);
    }

    Ok(writes)
}
