use archive::ArchiveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not write frame: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("persisting state failed: {0}")]
    Persist(#[from] ArchiveError),
    #[error("publishing frame failed: {0}")]
    Publish(#[from] PublishError),
}
