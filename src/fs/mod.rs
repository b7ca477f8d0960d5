//! File system access
//!
//! Asset loaders only see the `FileSystem` trait:
//! - `DiskFileSystem`: files under a root directory, memory-mapped
//! - `MemoryFileSystem`: in-memory files (tools and tests)
//!
//! Streams implement `std::io::Read`, so a read of fewer bytes than
//! requested surfaces as `UnexpectedEof` through `read_exact`.

use log::{debug, trace};
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// File open mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
}

/// Readable byte stream with a known size
pub trait Stream: Read {
    /// Total size of the underlying file in bytes
    fn size(&self) -> u64;

    /// Read the remainder of the stream into a buffer
    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.size() as usize);
        self.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// File system collaborator
pub trait FileSystem {
    fn open(&self, path: &Path, mode: FileMode) -> io::Result<Box<dyn Stream>>;
}

/// Memory-mapped file stream
struct MappedStream {
    cursor: Cursor<Mmap>,
}

impl Read for MappedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Stream for MappedStream {
    fn size(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }
}

/// Files below a root directory
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystem for DiskFileSystem {
    fn open(&self, path: &Path, mode: FileMode) -> io::Result<Box<dyn Stream>> {
        let full = self.root.join(path);
        debug!("Opening {} ({:?})", full.display(), mode);

        let file = File::open(&full)?;
        // Empty files cannot be mapped
        if file.metadata()?.len() == 0 {
            return Ok(Box::new(MemoryStream {
                cursor: Cursor::new(Vec::new()),
            }));
        }
        // SAFETY: asset files are not modified while mapped
        let map = unsafe { Mmap::map(&file)? };

        Ok(Box::new(MappedStream {
            cursor: Cursor::new(map),
        }))
    }
}

/// Owned in-memory file stream
struct MemoryStream {
    cursor: Cursor<Vec<u8>>,
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Stream for MemoryStream {
    fn size(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }
}

/// In-memory file table keyed by path
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl Into<PathBuf>, data: Vec<u8>) {
        self.files.insert(path.into(), data);
    }
}

impl FileSystem for MemoryFileSystem {
    fn open(&self, path: &Path, mode: FileMode) -> io::Result<Box<dyn Stream>> {
        trace!("Opening in-memory {} ({:?})", path.display(), mode);
        let data = self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })?;

        Ok(Box::new(MemoryStream {
            cursor: Cursor::new(data),
        }))
    }
}
