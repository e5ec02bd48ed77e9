//! dimscan-io: Filesystem I/O for dimscan.
//!
//! Provides [`FrameSource`](dimscan_pipeline::FrameSource)
//! implementations backed by image files, and persistence of the
//! annotated artifacts an analysis run selects. The measurement core in
//! `dimscan-pipeline` stays free of any filesystem access.

pub mod artifact;
pub mod source;

use std::path::PathBuf;

pub use artifact::{SavedArtifact, artifact_filename, encode_jpeg, save_artifacts};
pub use source::{DirectorySource, PathSource, StillImageSource, load_frame};

/// Errors from filesystem frame sources and artifact persistence.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoding or encoding an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A frame directory holds no image files.
    #[error("no image files found in {}", .0.display())]
    EmptyDirectory(PathBuf),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_dirs {
    //! Scratch directories for unit tests, removed when dropped.

    use std::ops::Deref;
    use std::path::{Path, PathBuf};

    pub struct ScratchDir(PathBuf);

    impl ScratchDir {
        /// A fresh directory path unique to this process and `name`.
        ///
        /// The directory itself is only created when `create` is set.
        pub fn new(name: &str, create: bool) -> Self {
            let dir = std::env::temp_dir().join(format!("dimscan-io-{name}-{}", std::process::id()));
            let _ = std::fs::remove_dir_all(&dir);
            if create {
                std::fs::create_dir_all(&dir).unwrap();
            }
            Self(dir)
        }
    }

    impl Deref for ScratchDir {
        type Target = Path;

        fn deref(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let dir = ScratchDir::new("drop", true);
        std::fs::write(dir.join("frame.png"), [0u8]).unwrap();
        let path = dir.to_path_buf();
        assert!(path.is_dir());
        drop(dir);
        assert!(!path.exists());
    }
}
