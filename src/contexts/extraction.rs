use crate::contexts::{scan_code_blocks, FilenameResolver};
use crate::data::gemini::GenerateContentResponse;
use crate::data::{FileSink, FilenameSource};

/// Marker left by models in place of elided code
const PLACEHOLDER_MARKER: &str = "(rest of the";

/// Outcome of one extraction pass, in source order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub saved: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl ExtractionReport {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Turns model responses into files.
///
/// Every failure is reported on the console and recorded in the returned
/// report; nothing is propagated to the caller.
pub struct ResponseExtractor<S: FileSink> {
    resolver: FilenameResolver,
    sink: S,
}

impl<S: FileSink> ResponseExtractor<S> {
    pub fn new(resolver: FilenameResolver, sink: S) -> Self {
        Self { resolver, sink }
    }

    /// Extracts code from the first candidate of `response`.
    ///
    /// Responses without candidates, parts or text are logged and skipped.
    pub fn process_response(&mut self, response: &GenerateContentResponse) -> ExtractionReport {
        let Some(candidate) = response.candidates.first() else {
            log::info!("Received an empty response");
            return ExtractionReport::default();
        };

        let has_parts = candidate
            .content
            .as_ref()
            .is_some_and(|content| !content.parts.is_empty());
        if !has_parts {
            log::info!("Response candidate has no content parts");
            return ExtractionReport::default();
        }

        let text = response.text();
        if text.is_empty() {
            log::info!("Response contains no text parts.");
            return ExtractionReport::default();
        }

        self.process_text(&text)
    }

    /// Scans `text` for code blocks and writes each one, in order.
    pub fn process_text(&mut self, text: &str) -> ExtractionReport {
        let mut report = ExtractionReport::default();
        let blocks = scan_code_blocks(text);

        if blocks.is_empty() {
            log::debug!("No code blocks found in the response.");
            return report;
        }

        log::info!("--- Processing Code Blocks ---");

        for (i, block) in blocks.iter().enumerate() {
            println!("Found Block {}: Language='{}'", i + 1, block.language);

            let resolved = self.resolver.resolve(text, block, blocks.get(i + 1));
            match resolved.source {
                FilenameSource::Directive => {
                    println!("  Found directive, using filename: {}", resolved.filename)
                }
                FilenameSource::Generated => println!(
                    "  No filename directive found, using generated name: {}",
                    resolved.filename
                ),
            }

            if resolved.content.contains(PLACEHOLDER_MARKER) {
                println!("  Skipping placeholder content for {}", resolved.filename);
                report.skipped.push(resolved.filename);
                continue;
            }

            match self.sink.write_file(&resolved.filename, &resolved.content) {
                Ok(()) if self.sink.is_dry_run() => {
                    println!("  Dry run, would save content to {}", resolved.filename);
                    report.saved.push(resolved.filename);
                }
                Ok(()) => {
                    println!("  Successfully saved content to {}", resolved.filename);
                    report.saved.push(resolved.filename);
                }
                Err(e) => {
                    println!("  Error writing file '{}': {}", resolved.filename, e);
                    report.failed.push(resolved.filename);
                }
            }
        }

        log::info!("--- Finished Processing Code Blocks ---");
        report
    }
}
