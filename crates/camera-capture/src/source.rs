//! Frame sources

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{CameraError, SourceConfig, VideoFrame};

/// Acquire/release contract for anything that yields sequential frames.
///
/// `close` must be safe to call more than once; the monitoring loop calls it
/// on every exit path.
pub trait FrameSource: Send {
    /// Acquire the underlying device or file handle
    fn open(&mut self) -> Result<(), CameraError>;

    /// Read the next frame
    fn read_frame(&mut self) -> Result<VideoFrame, CameraError>;

    /// Release the underlying resource
    fn close(&mut self);

    /// Whether `open` succeeded and `close` has not been called since
    fn is_open(&self) -> bool;
}

const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

/// Replays still images from a directory, in lexical file-name order
pub struct ImageSequenceSource {
    directory: PathBuf,
    looping: bool,
    mirror: bool,
    files: Vec<PathBuf>,
    cursor: usize,
    sequence: u64,
    opened_at: Option<Instant>,
}

impl ImageSequenceSource {
    /// Create a source over `directory` (not opened yet)
    pub fn new(directory: impl AsRef<Path>, looping: bool) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            looping,
            mirror: false,
            files: Vec::new(),
            cursor: 0,
            sequence: 0,
            opened_at: None,
        }
    }

    /// Create a source from configuration
    pub fn from_config(config: &SourceConfig) -> Self {
        let mut source = Self::new(&config.directory, config.looping);
        source.mirror = config.mirror;
        source
    }

    /// Number of images discovered by `open`
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether `open` found no images
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn scan(&self) -> Result<Vec<PathBuf>, CameraError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> Result<(), CameraError> {
        let files = self.scan().map_err(|e| {
            CameraError::Open(format!("{}: {}", self.directory.display(), e))
        })?;
        if files.is_empty() {
            return Err(CameraError::Open(format!(
                "no images found in {}",
                self.directory.display()
            )));
        }

        info!("Opened image sequence {} ({} frames)", self.directory.display(), files.len());
        self.files = files;
        self.cursor = 0;
        self.sequence = 0;
        self.opened_at = Some(Instant::now());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        let opened_at = self.opened_at.ok_or(CameraError::NotInitialized)?;

        if self.cursor >= self.files.len() {
            if !self.looping {
                return Err(CameraError::EndOfStream);
            }
            debug!("Image sequence exhausted, looping");
            self.cursor = 0;
        }

        let path = &self.files[self.cursor];
        self.cursor += 1;

        let img = image::open(path)
            .map_err(|e| {
                warn!("Failed to decode {}: {}", path.display(), e);
                CameraError::Decode(e.to_string())
            })?
            .to_rgb8();

        self.sequence += 1;
        let timestamp_ns = opened_at.elapsed().as_nanos() as u64;
        let mut frame = VideoFrame::from_rgb_image(img, timestamp_ns, self.sequence);
        if self.mirror {
            frame.mirror();
        }
        Ok(frame)
    }

    fn close(&mut self) {
        if self.opened_at.take().is_some() {
            info!("Closed image sequence {}", self.directory.display());
        }
    }

    fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }
}

impl Drop for ImageSequenceSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("camera-capture-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_frames(dir: &Path, count: u8) {
        for i in 0..count {
            let img = RgbImage::from_pixel(4, 2, Rgb([i * 10, 0, 0]));
            img.save(dir.join(format!("frame_{:03}.png", i))).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not an image").unwrap();
    }

    #[test]
    fn test_read_before_open() {
        let mut source = ImageSequenceSource::new("/nonexistent", false);
        assert!(matches!(source.read_frame(), Err(CameraError::NotInitialized)));
        assert!(source.open().is_err());
    }

    #[test]
    fn test_sequence_and_end_of_stream() {
        let dir = temp_dir("eos");
        write_frames(&dir, 3);

        let mut source = ImageSequenceSource::new(&dir, false);
        source.open().unwrap();
        assert_eq!(source.len(), 3);

        let sequences: Vec<u64> = (0..3).map(|_| source.read_frame().unwrap().sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert!(matches!(source.read_frame(), Err(CameraError::EndOfStream)));

        source.close();
        assert!(!source.is_open());
        source.close();
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_looping_keeps_sequence_increasing() {
        let dir = temp_dir("loop");
        write_frames(&dir, 2);

        let mut source = ImageSequenceSource::new(&dir, true);
        source.open().unwrap();
        let frames: Vec<VideoFrame> = (0..5).map(|_| source.read_frame().unwrap()).collect();
        assert_eq!(frames[4].sequence, 5);
        assert_eq!(frames[2].get_pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(frames[3].get_pixel(0, 0), Some([10, 0, 0]));
        std::fs::remove_dir_all(dir).ok();
    }
}
