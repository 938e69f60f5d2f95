mod chat_session;
mod extraction;
mod fence_scanner;
mod file_writer;
mod filename_resolver;
mod gemini_client;

pub use chat_session::ChatSession;
pub use extraction::{ExtractionReport, ResponseExtractor};
pub use fence_scanner::scan_code_blocks;
pub use file_writer::{DirectoryWriter, DryRunWriter};
pub use filename_resolver::{clean_path, find_directive, sanitize_filename, FilenameResolver};
pub use gemini_client::{read_event_stream, GeminiClient, GeminiError, GenerativeModel, DEFAULT_BASE_URL};
