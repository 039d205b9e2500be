use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Defers opening a `VideoWriter` until the first frame arrives.
///
/// Cropped output dimensions are only known once a frame has been
/// composited, so the destination file is created on the first `write`
/// with that frame's size. If nothing is ever written, no file exists.
pub struct LazyVideoSink {
    writer: Box<dyn VideoWriter>,
    destination: PathBuf,
    source: VideoMetadata,
    opened: bool,
    frames_written: usize,
}

impl LazyVideoSink {
    pub fn new(writer: Box<dyn VideoWriter>, destination: &Path, source: &VideoMetadata) -> Self {
        Self {
            writer,
            destination: destination.to_path_buf(),
            source: source.clone(),
            opened: false,
            frames_written: 0,
        }
    }

    pub fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if !self.opened {
            let metadata = self.source.resized(frame.width(), frame.height());
            log::info!(
                "Opening output {} at {}x{} ({:.2} fps)",
                self.destination.display(),
                metadata.width,
                metadata.height,
                metadata.fps
            );
            self.writer.open(&self.destination, &metadata)?;
            self.opened = true;
        }
        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Closes the writer if it was ever opened.
    ///
    /// Returns the destination path when a file was produced. If the writer
    /// fails to finalize, the incomplete file is removed before the error is
    /// returned.
    pub fn finish(mut self) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
        if !self.opened {
            return Ok(None);
        }
        if let Err(e) = self.writer.close() {
            self.remove_partial()?;
            return Err(e);
        }
        Ok(Some(self.destination))
    }

    /// Closes the writer and deletes any partially written output. The file
    /// is removed even when closing fails.
    pub fn discard(mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.opened {
            return Ok(());
        }
        let closed = self.writer.close();
        self.remove_partial()?;
        closed
    }

    fn remove_partial(&self) -> std::io::Result<()> {
        if self.destination.exists() {
            std::fs::remove_file(&self.destination)?;
            log::info!("Discarded partial output {}", self.destination.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        opened_with: Option<(u32, u32, f64)>,
        written: usize,
        closed: bool,
    }

    struct RecordingWriter {
        calls: Arc<Mutex<Calls>>,
        fail_close: bool,
    }

    impl VideoWriter for RecordingWriter {
        fn open(
            &mut self,
            _path: &Path,
            metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().opened_with =
                Some((metadata.width, metadata.height, metadata.fps));
            Ok(())
        }

        fn write(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().written += 1;
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().closed = true;
            if self.fail_close {
                return Err("trailer write failed".into());
            }
            Ok(())
        }
    }

    fn source() -> VideoMetadata {
        VideoMetadata {
            width: 100,
            height: 100,
            fps: 25.0,
            total_frames: 10,
            codec: "mpeg4".to_string(),
            source_path: None,
        }
    }

    fn sink() -> (LazyVideoSink, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let writer = RecordingWriter {
            calls: calls.clone(),
            fail_close: false,
        };
        let sink = LazyVideoSink::new(Box::new(writer), Path::new("/tmp/out.mp4"), &source());
        (sink, calls)
    }

    #[test]
    fn test_not_opened_before_first_write() {
        let (sink, calls) = sink();
        assert!(!sink.is_open());
        assert!(calls.lock().unwrap().opened_with.is_none());
    }

    #[test]
    fn test_first_write_opens_with_frame_size_and_source_fps() {
        let (mut sink, calls) = sink();
        sink.write(&Frame::new(vec![0; 90 * 90 * 3], 90, 90, 3, 0))
            .unwrap();
        sink.write(&Frame::new(vec![0; 90 * 90 * 3], 90, 90, 3, 1))
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.opened_with, Some((90, 90, 25.0)));
        assert_eq!(calls.written, 2);
        assert_eq!(sink.frames_written(), 2);
    }

    #[test]
    fn test_finish_without_writes_produces_nothing() {
        let (sink, calls) = sink();
        assert_eq!(sink.finish().unwrap(), None);
        assert!(!calls.lock().unwrap().closed);
    }

    #[test]
    fn test_finish_after_writes_closes_and_returns_path() {
        let (mut sink, calls) = sink();
        sink.write(&Frame::new(vec![0; 3], 1, 1, 3, 0)).unwrap();
        let path = sink.finish().unwrap();
        assert_eq!(path, Some(PathBuf::from("/tmp/out.mp4")));
        assert!(calls.lock().unwrap().closed);
    }

    #[test]
    fn test_discard_closes_and_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("partial.mp4");
        std::fs::write(&destination, b"partial").unwrap();

        let calls = Arc::new(Mutex::new(Calls::default()));
        let writer = RecordingWriter {
            calls: calls.clone(),
            fail_close: false,
        };
        let mut sink = LazyVideoSink::new(Box::new(writer), &destination, &source());
        sink.write(&Frame::new(vec![0; 3], 1, 1, 3, 0)).unwrap();
        sink.discard().unwrap();

        assert!(calls.lock().unwrap().closed);
        assert!(!destination.exists());
    }

    #[test]
    fn test_discard_unopened_is_noop() {
        let (sink, calls) = sink();
        sink.discard().unwrap();
        assert!(!calls.lock().unwrap().closed);
    }

    fn partial_file_sink(fail_close: bool) -> (LazyVideoSink, PathBuf, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("partial.mp4");
        std::fs::write(&destination, b"partial").unwrap();
        let writer = RecordingWriter {
            calls: Arc::new(Mutex::new(Calls::default())),
            fail_close,
        };
        let mut sink = LazyVideoSink::new(Box::new(writer), &destination, &source());
        sink.write(&Frame::new(vec![0; 3], 1, 1, 3, 0)).unwrap();
        (sink, destination, dir)
    }

    #[test]
    fn test_failed_finish_removes_file() {
        let (sink, destination, _dir) = partial_file_sink(true);
        let err = sink.finish().unwrap_err();
        assert_eq!(err.to_string(), "trailer write failed");
        assert!(!destination.exists());
    }

    #[test]
    fn test_discard_removes_file_even_if_close_fails() {
        let (sink, destination, _dir) = partial_file_sink(true);
        assert!(sink.discard().is_err());
        assert!(!destination.exists());
    }
}
