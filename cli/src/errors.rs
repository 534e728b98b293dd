use archive::ArchiveError;
use canvas::CanvasError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Archive(#[from] ArchiveError),
    #[error("{0}")]
    Canvas(#[from] CanvasError),
    #[error("{0}")]
    Image(#[from] image::ImageError),
    #[error("pixel ({x}, {y}) has no controlling byte")]
    Unreachable { x: u32, y: u32 },
}
