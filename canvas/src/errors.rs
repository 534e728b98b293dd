use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    #[error("offset {offset} is outside the buffer of {len} bytes")]
    InvalidOffset { offset: usize, len: usize },
    #[error("state buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
}
