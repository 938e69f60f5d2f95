use crate::data::FileSink;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Writes extracted files into a directory on disk.
///
/// Files are created or truncated and receive mode `0644` on Unix.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    /// Directory receiving the files (defaults to the working directory)
    root: PathBuf,
}

impl DirectoryWriter {
    /// Creates a new DirectoryWriter
    ///
    /// # Arguments
    /// * `root` - Optional target directory. If None, defaults to "."
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root: root.unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    fn target_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

impl FileSink for DirectoryWriter {
    fn write_file(&self, filename: &str, content: &str) -> io::Result<()> {
        let path = self.target_path(filename);

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let mut file = options.open(&path)?;
        file.write_all(content.as_bytes())
    }
}

/// Accepts every write without touching the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunWriter;

impl FileSink for DryRunWriter {
    fn write_file(&self, filename: &str, content: &str) -> io::Result<()> {
        log::debug!("dry run: skipped writing {} bytes to {}", content.len(), filename);
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
