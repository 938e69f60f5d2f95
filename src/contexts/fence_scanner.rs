use crate::data::CodeBlock;
use regex::Regex;
use std::sync::OnceLock;

/// Opening fence, the rest of its line, a newline, lazily matched content,
/// an optional newline and the closing fence.
///
/// The newline after the opening line is mandatory, so blocks written on a
/// single line are not recognised.
fn code_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```([^\n]*)\n(.*?)\n?```").expect("valid regex"))
}

/// Scans `text` for fenced code blocks, in source order.
///
/// Returns an empty vector when nothing matches. The result depends only on
/// the input text.
pub fn scan_code_blocks(text: &str) -> Vec<CodeBlock> {
    code_block_re()
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let tag = captures.get(1).map_or("", |m| m.as_str());
            let content = captures.get(2).map_or("", |m| m.as_str());

            Some(CodeBlock {
                language: language_from_tag(tag),
                content: content.trim().to_string(),
                span: whole.start()..whole.end(),
            })
        })
        .collect()
}

/// Keeps the opening-line tag only if it is a plain identifier.
fn language_from_tag(tag: &str) -> String {
    let tag = tag.trim();
    let is_identifier =
        !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if is_identifier {
        tag.to_string()
    } else {
        String::new()
    }
}
