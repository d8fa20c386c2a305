use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{RenderError, Result};
use crate::surface::types::Frame;

/// Writes drawn frames to a directory as a numbered PNG sequence
///
/// Frames are numbered by how many frames have been drawn, so skipped frames
/// leave no gap in the selection.
#[derive(Debug)]
pub struct FrameRecorder {
    dir: PathBuf,
    every_n_frames: u64,
    drawn: u64,
    written: u64,
}

impl FrameRecorder {
    /// Create the output directory if needed.
    ///
    /// Only every `every_n_frames`-th drawn frame is written, starting with the first.
    pub fn new<P: AsRef<Path>>(dir: P, every_n_frames: u64) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir)?;
        info!("Recording frames to {:?} (every {} drawn frame(s))", dir, every_n_frames.max(1));
        Ok(Self { dir, every_n_frames: every_n_frames.max(1), drawn: 0, written: 0 })
    }

    /// Count one drawn frame and save it as `frame_NNNNNN.png` if it is selected
    pub fn record(&mut self, frame: &Frame) -> Result<Option<PathBuf>> {
        let index = self.drawn;
        self.drawn += 1;
        if index % self.every_n_frames != 0 {
            return Ok(None);
        }

        let path = self.dir.join(format!("frame_{:06}.png", index));
        debug!("Saving frame to: {:?}", path);
        frame.save_png(&path).map_err(|e| RenderError::FrameWriteFailed {
            index,
            reason: e.to_string(),
        })?;

        self.written += 1;
        Ok(Some(path))
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_records_every_nth_drawn_frame() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("frames");
        let mut recorder = FrameRecorder::new(&out, 2).unwrap();
        let frame = Frame::new_filled(4, 4, [10, 20, 30]);

        let saved: Vec<bool> = (0..5)
            .map(|_| recorder.record(&frame).unwrap().is_some())
            .collect();

        assert_eq!(saved, [true, false, true, false, true]);
        assert_eq!(recorder.written(), 3);
        assert!(out.join("frame_000000.png").exists());
        assert!(!out.join("frame_000001.png").exists());
        assert!(out.join("frame_000004.png").exists());

        let saved = image::open(out.join("frame_000002.png")).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(1, 1).0, [10, 20, 30]);
    }
}
