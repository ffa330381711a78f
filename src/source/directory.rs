use super::{Frame, FrameSource};
use crate::decoder::{DecodeInvoker, Decoder};
use crate::error::{Result, ScanError};
use crate::models::{ScanRecord, SourceKind};
use crate::tools::{collect_images, load_image};
use log::info;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Walks a directory and loads image files one at a time, in path order.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
    max_dim: Option<u32>,
}

impl DirectorySource {
    /// Enumerate images under `root`. Fails if `root` is not a readable directory.
    pub fn open(root: impl AsRef<Path>, recursive: bool, max_dim: Option<u32>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ScanError::unreadable(root, "directory not found"));
        }
        let paths = collect_images(root, recursive).map_err(|err| ScanError::unreadable(root, err))?;
        info!(
            "Found {} image files to scan in {}",
            paths.len(),
            root.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            paths,
            next: 0,
            max_dim,
        })
    }

    /// Keep only the first `limit` files.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.paths.truncate(limit);
        self
    }

    /// Directory being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file this source will visit, in order
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn load(&self, path: &Path, sequence: u64) -> Result<Frame> {
        let image = load_image(path)?;
        Ok(Frame::prepared(image, SourceKind::Directory, self.max_dim)
            .with_path(path)
            .with_sequence(sequence))
    }

    /// Load and decode every remaining file on the rayon pool.
    ///
    /// Results come back in path order, one entry per file.
    pub fn decode_remaining<D: Decoder>(
        &mut self,
        invoker: &DecodeInvoker<D>,
    ) -> Vec<(PathBuf, Result<Vec<ScanRecord>>)> {
        let start = self.next;
        self.next = self.paths.len();
        let this = &*self;
        this.paths[start..]
            .par_iter()
            .enumerate()
            .map(|(offset, path)| {
                let outcome = this
                    .load(path, (start + offset + 1) as u64)
                    .map(|frame| invoker.process(&frame));
                (path.clone(), outcome)
            })
            .collect()
    }
}

impl FrameSource for DirectorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    fn next_frame(&mut self) -> Option<Result<Frame>> {
        let path = self.paths.get(self.next)?.clone();
        self.next += 1;
        info!("Scanning: {}", path.display());
        Some(self.load(&path, self.next as u64))
    }
}
