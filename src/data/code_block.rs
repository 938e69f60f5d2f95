use std::ops::Range;

/// A fenced region found in a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Declared language tag, or empty when absent or malformed
    pub language: String,
    /// Text between the opening fence line and the closing fence, trimmed
    pub content: String,
    /// Byte range of the whole block in the source text, fences included
    pub span: Range<usize>,
}

/// Where a resolved filename came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameSource {
    /// A `Filename:` directive following the block
    Directive,
    /// A generated unique name
    Generated,
}

/// A code block paired with the file it should be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub filename: String,
    pub content: String,
    pub source: FilenameSource,
}
