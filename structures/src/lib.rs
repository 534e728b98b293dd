use bincode::{Decode, Encode};
use std::collections::HashMap;

pub const WIDTH: u32 = 512;
pub const HEIGHT: u32 = 512;
/// Largest possible body of a 512x512 RGBA QOI image.
pub const BUFFER_LEN: usize = 4 * WIDTH as usize * HEIGHT as usize;

/// "qoif", 512 wide, 512 high, 3 channels, sRGB.
pub const QOI_HEADER: [u8; 14] = [
    b'q', b'o', b'i', b'f', 0, 0, 2, 0, 0, 0, 2, 0, 3, 0,
];
pub const QOI_TRAILER: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

/// Caller id that force-cleared bytes are attributed to.
pub const ADMIN_CALLER: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct WriteEvent {
    pub caller: String,
    pub at: f64,
    pub offset: u32,
    pub value: u8,
}

/// Everything that survives a restart.
#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub cooldowns: HashMap<String, f64>,
    pub buffer: Vec<u8>,
    pub history: Vec<WriteEvent>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            cooldowns: HashMap::new(),
            buffer: vec![0; BUFFER_LEN],
            history: Vec::new(),
        }
    }
}

/// Wraps a canvas body into a complete QOI file.
pub fn frame_qoi(body: &[u8]) -> Vec<u8> {
    let mut file = Vec::with_capacity(QOI_HEADER.len() + body.len() + QOI_TRAILER.len());
    file.extend_from_slice(&QOI_HEADER);
    file.extend_from_slice(body);
    file.extend_from_slice(&QOI_TRAILER);
    file
}

/// Strips header and trailer from a QOI file. Files too short to carry both
/// yield an empty body.
pub fn qoi_body(file: &[u8]) -> &[u8] {
    if file.len() < QOI_HEADER.len() + QOI_TRAILER.len() {
        return &[];
    }
    &file[QOI_HEADER.len()..file.len() - QOI_TRAILER.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_strips_back_to_body() {
        let body = vec![0xfe, 1, 2, 3];
        let file = frame_qoi(&body);

        assert_eq!(file.len(), 14 + 4 + 8);
        assert_eq!(&file[0..4], b"qoif");
        assert_eq!(qoi_body(&file), body.as_slice());
    }

    #[test]
    fn short_file_has_empty_body() {
        assert!(qoi_body(b"qoif").is_empty());
    }

    #[test]
    fn default_state_is_zeroed() {
        let state = PersistedState::default();
        assert_eq!(state.buffer.len(), BUFFER_LEN);
        assert!(state.buffer.iter().all(|b| *b == 0));
        assert!(state.cooldowns.is_empty());
    }
}
