//! Frame source abstraction and scoped acquisition.
//!
//! A [`FrameSource`] is anything that can be opened, asked for frames
//! one at a time, and released: a camera, a directory of stills, or a
//! scripted sequence in tests. The pipeline never touches a device
//! directly.
//!
//! [`SourceGuard`] owns an open handle and releases it when dropped, so
//! the handle is released exactly once on every exit path, including
//! early returns and unwinding.

use serde::{Deserialize, Serialize};

use crate::types::{Frame, SourceError};

/// A supplier of raw frames.
pub trait FrameSource {
    /// State of an opened source (device handle, file cursor, ...).
    type Handle;

    /// Open the source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying resource is unavailable.
    fn open(&mut self) -> Result<Self::Handle, SourceError>;

    /// Read the next frame, or `None` if no frame could be delivered.
    fn read(&mut self, handle: &mut Self::Handle) -> Option<Frame>;

    /// Release an opened handle.
    fn release(&mut self, handle: Self::Handle);
}

/// An opened [`FrameSource`] that releases its handle on drop.
pub struct SourceGuard<'a, S: FrameSource> {
    source: &'a mut S,
    handle: Option<S::Handle>,
}

impl<'a, S: FrameSource> SourceGuard<'a, S> {
    /// Open `source` and take ownership of the resulting handle.
    ///
    /// # Errors
    ///
    /// Propagates the [`SourceError`] from [`FrameSource::open`]; nothing
    /// needs releasing in that case.
    pub fn open(source: &'a mut S) -> Result<Self, SourceError> {
        let handle = source.open()?;
        Ok(Self {
            source,
            handle: Some(handle),
        })
    }

    /// Read the next frame from the held handle.
    pub fn read(&mut self) -> Option<Frame> {
        let handle = self.handle.as_mut()?;
        self.source.read(handle)
    }
}

impl<S: FrameSource> Drop for SourceGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.source.release(handle);
            tracing::debug!("frame source released");
        }
    }
}

/// Result of a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// `true` if the source opened and delivered a frame.
    pub success: bool,
    /// Human-readable explanation.
    pub message: String,
}

/// Check that a source can be opened and delivers at least one frame.
///
/// Opens the source, reads a single frame, and releases it again.
pub fn test_connection<S: FrameSource>(source: &mut S) -> ConnectionStatus {
    let mut guard = match SourceGuard::open(source) {
        Ok(guard) => guard,
        Err(e) => {
            return ConnectionStatus {
                success: false,
                message: e.to_string(),
            };
        }
    };

    match guard.read() {
        Some(frame) => ConnectionStatus {
            success: true,
            message: format!(
                "frame source connected, delivering {}x{} frames",
                frame.width(),
                frame.height()
            ),
        },
        None => ConnectionStatus {
            success: false,
            message: "frame source opened but delivered no frame".to_string(),
        },
    }
}
