use std::io;

/// Destination for extracted files.
///
/// Implementations report failures per call; the caller decides whether a
/// failure stops anything (the extraction engine never does).
pub trait FileSink {
    /// Writes `content` as the complete contents of `filename`.
    ///
    /// # Arguments
    /// * `filename` - The resolved file name, relative to the sink's root
    /// * `content` - The raw text to store
    fn write_file(&self, filename: &str, content: &str) -> io::Result<()>;

    /// Whether writes are only simulated
    fn is_dry_run(&self) -> bool {
        false
    }
}

impl<T: FileSink + ?Sized> FileSink for Box<T> {
    fn write_file(&self, filename: &str, content: &str) -> io::Result<()> {
        (**self).write_file(filename, content)
    }

    fn is_dry_run(&self) -> bool {
        (**self).is_dry_run()
    }
}
