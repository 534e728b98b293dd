use std::{fs, path::PathBuf};

use canvas::CanvasStats;
use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};
use log::info;
use structures::frame_qoi;

use crate::errors::PublishError;

/// One published state of the canvas.
pub struct Frame<'a> {
    pub body: &'a [u8],
    pub image: &'a RgbImage,
    pub stats: CanvasStats,
    pub taken_at: DateTime<Local>,
}

impl<'a> Frame<'a> {
    pub fn caption(&self) -> String {
        format!("New frame: {}. This is the result.", self.stats)
    }

    pub fn file_stem(&self) -> String {
        format!("qoiplace_{}", self.taken_at.format("%Y%m%d_%H%M%S"))
    }
}

pub trait Publisher: Send {
    fn publish(&mut self, frame: &Frame) -> Result<(), PublishError>;
}

/// Drops each frame into a directory as a `.qoi` and a `.png` file.
pub struct FilePublisher {
    dir: PathBuf,
}

impl FilePublisher {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl Publisher for FilePublisher {
    fn publish(&mut self, frame: &Frame) -> Result<(), PublishError> {
        fs::create_dir_all(&self.dir)?;
        let stem = frame.file_stem();

        let qoi_path = self.dir.join(format!("{stem}.qoi"));
        fs::write(&qoi_path, frame_qoi(frame.body))?;

        let png_path = self.dir.join(format!("{stem}.png"));
        frame.image.save_with_format(&png_path, ImageFormat::Png)?;

        info!("{} ({})", frame.caption(), png_path.display());
        Ok(())
    }
}
