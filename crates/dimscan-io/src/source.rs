//! Frame sources backed by image files.
//!
//! - [`DirectorySource`] replays a directory of frames in filename order,
//!   one frame per capture, as if they came from a camera.
//! - [`StillImageSource`] delivers the same still image on every capture,
//!   like a fixed camera looking at a static scene.
//! - [`PathSource`] picks one of the two based on what a path points at.

use std::path::{Path, PathBuf};

use dimscan_pipeline::{Frame, FrameSource, SourceError};

use crate::IoError;

/// File extensions recognized as frames (compared case-insensitively).
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// Decode an image file into a frame.
///
/// # Errors
///
/// Returns [`IoError::Image`] if the file cannot be read or decoded.
pub fn load_frame(path: &Path) -> Result<Frame, IoError> {
    Ok(image::open(path)?.to_rgba8())
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FRAME_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// List the frame files in `dir`, sorted by file name.
fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if is_frame_file(&path) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(IoError::EmptyDirectory(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Replays the image files of a directory in lexicographic order.
///
/// A file that fails to decode is reported as a missing frame for that
/// capture. Once the files run out, every further read yields no frame.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Create a source over `dir`. Nothing is read until it is opened.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Open state of a [`DirectorySource`]: the files not yet delivered.
#[derive(Debug)]
pub struct DirectoryCursor {
    remaining: std::vec::IntoIter<PathBuf>,
}

impl FrameSource for DirectorySource {
    type Handle = DirectoryCursor;

    fn open(&mut self) -> Result<DirectoryCursor, SourceError> {
        let files = list_frames(&self.dir).map_err(|e| SourceError(e.to_string()))?;
        tracing::debug!(dir = %self.dir.display(), frames = files.len(), "opened frame directory");
        Ok(DirectoryCursor {
            remaining: files.into_iter(),
        })
    }

    fn read(&mut self, handle: &mut DirectoryCursor) -> Option<Frame> {
        let path = handle.remaining.next()?;
        match load_frame(&path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable frame");
                None
            }
        }
    }

    fn release(&mut self, handle: DirectoryCursor) {
        tracing::debug!(
            dir = %self.dir.display(),
            unread = handle.remaining.len(),
            "closed frame directory"
        );
    }
}

/// Delivers one still image on every read.
#[derive(Debug, Clone)]
pub struct StillImageSource {
    path: PathBuf,
}

impl StillImageSource {
    /// Create a source over the image at `path`. Nothing is read until it
    /// is opened.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for StillImageSource {
    type Handle = Frame;

    fn open(&mut self) -> Result<Frame, SourceError> {
        load_frame(&self.path).map_err(|e| SourceError(format!("{}: {e}", self.path.display())))
    }

    fn read(&mut self, handle: &mut Frame) -> Option<Frame> {
        Some(handle.clone())
    }

    fn release(&mut self, _handle: Frame) {}
}

/// A directory or still-image source, chosen by what a path points at.
#[derive(Debug, Clone)]
pub enum PathSource {
    /// The path is a directory of frames.
    Directory(DirectorySource),
    /// The path is a single image.
    Still(StillImageSource),
}

impl PathSource {
    /// Pick a source for `path`: directories replay their files, anything
    /// else is treated as a still image.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            Self::Directory(DirectorySource::new(path))
        } else {
            Self::Still(StillImageSource::new(path))
        }
    }
}

/// Open state of a [`PathSource`].
#[derive(Debug)]
pub enum PathHandle {
    /// Cursor over a frame directory.
    Directory(DirectoryCursor),
    /// Decoded still image.
    Still(Frame),
}

impl FrameSource for PathSource {
    type Handle = PathHandle;

    fn open(&mut self) -> Result<PathHandle, SourceError> {
        match self {
            Self::Directory(s) => s.open().map(PathHandle::Directory),
            Self::Still(s) => s.open().map(PathHandle::Still),
        }
    }

    fn read(&mut self, handle: &mut PathHandle) -> Option<Frame> {
        match (self, handle) {
            (Self::Directory(s), PathHandle::Directory(h)) => s.read(h),
            (Self::Still(s), PathHandle::Still(h)) => s.read(h),
            _ => None,
        }
    }

    fn release(&mut self, handle: PathHandle) {
        match (self, handle) {
            (Self::Directory(s), PathHandle::Directory(h)) => s.release(h),
            (Self::Still(s), PathHandle::Still(h)) => s.release(h),
            _ => {}
        }
    }
}
