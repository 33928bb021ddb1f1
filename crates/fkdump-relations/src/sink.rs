//! Destinations for per-type fixture files.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Receives one named fixture artifact at a time.
pub trait FixtureSink {
    fn write_fixture(&mut self, name: &str, contents: &[u8]) -> io::Result<()>;
}

impl<T: FixtureSink + ?Sized> FixtureSink for &mut T {
    fn write_fixture(&mut self, name: &str, contents: &[u8]) -> io::Result<()> {
        (**self).write_fixture(name, contents)
    }
}

/// Writes fixtures as files into an existing directory.
///
/// The directory is never created; a missing directory fails every write.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FixtureSink for DirectorySink {
    fn write_fixture(&mut self, name: &str, contents: &[u8]) -> io::Result<()> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("output directory {} does not exist", self.root.display()),
            ));
        }
        std::fs::write(self.root.join(name), contents)
    }
}

/// Keeps fixtures in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FixtureSink for MemorySink {
    fn write_fixture(&mut self, name: &str, contents: &[u8]) -> io::Result<()> {
        self.files.insert(name.to_string(), contents.to_vec());
        Ok(())
    }
}
