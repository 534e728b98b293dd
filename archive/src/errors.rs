use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("could not access state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode state: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("could not decode state: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("could not replace state file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("stored buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
}
