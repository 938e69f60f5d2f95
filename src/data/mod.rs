mod code_block;
mod file_sink;
pub mod gemini;

pub use code_block::{CodeBlock, FilenameSource, ResolvedFile};
pub use file_sink::FileSink;
