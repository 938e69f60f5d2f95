use crate::data::{CodeBlock, FilenameSource, ResolvedFile};
use crate::registries::LanguageRegistry;
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// `Filename: name`, case-insensitive, with optional bold markers around the
/// label and optional backticks around the name.
fn filename_directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\*\*)?Filename:(?:\*\*)?\s*`?([^`\n]+)`?").expect("valid regex")
    })
}

/// Produces fallback name tokens
type TokenSource = Box<dyn FnMut() -> String>;

/// Picks the output filename for each extracted code block.
///
/// A `Filename:` directive in the text between a block and the next one
/// wins; otherwise a unique token plus an extension derived from the block's
/// language is generated.
pub struct FilenameResolver {
    registry: LanguageRegistry,
    token_source: TokenSource,
}

impl FilenameResolver {
    /// Creates a resolver that names fallback files with random UUIDs
    pub fn new(registry: LanguageRegistry) -> Self {
        Self::with_token_source(registry, || Uuid::new_v4().to_string())
    }

    /// Creates a resolver with a custom fallback token generator
    ///
    /// # Arguments
    /// * `registry` - Language to extension lookup
    /// * `token_source` - Called once per fallback name; must not repeat within a run
    pub fn with_token_source(
        registry: LanguageRegistry,
        token_source: impl FnMut() -> String + 'static,
    ) -> Self {
        Self {
            registry,
            token_source: Box::new(token_source),
        }
    }

    /// Resolves the filename for `block`.
    ///
    /// Only the window between this block's end and the start of `next` (or
    /// the end of `text` when `next` is None) is searched, so a directive
    /// never applies to more than one block.
    pub fn resolve(
        &mut self,
        text: &str,
        block: &CodeBlock,
        next: Option<&CodeBlock>,
    ) -> ResolvedFile {
        let window_end = next.map_or(text.len(), |next| next.span.start);

        let directive = search_window(text, block.span.end, window_end)
            .and_then(find_directive)
            .map(|name| clean_path(&sanitize_filename(&name)));

        match directive {
            Some(filename) => ResolvedFile {
                filename,
                content: block.content.clone(),
                source: FilenameSource::Directive,
            },
            None => ResolvedFile {
                filename: format!(
                    "{}.{}",
                    (self.token_source)(),
                    self.registry.extension_for(&block.language)
                ),
                content: block.content.clone(),
                source: FilenameSource::Generated,
            },
        }
    }
}

/// Text between `start` and `end`, or None for an empty or inverted range.
fn search_window(text: &str, start: usize, end: usize) -> Option<&str> {
    if start >= end {
        return None;
    }
    text.get(start..end)
}

/// Returns the trimmed name of the first `Filename:` directive in `window`,
/// if it is non-empty.
pub fn find_directive(window: &str) -> Option<String> {
    let captures = filename_directive_re().captures(window)?;
    let name = captures.get(1)?.as_str().trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Flattens a name into a single path component by replacing `/` and `\`.
pub fn sanitize_filename(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Lexically normalises a slash-separated path.
///
/// Repeated separators and `.` elements are removed and `..` consumes the
/// preceding element where one exists. An empty result becomes `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
