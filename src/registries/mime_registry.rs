use std::path::Path;

/// MIME type sent for uploads whose type cannot be guessed
const FALLBACK_MIME_TYPE: &str = "text/plain";

/// Text types the Files API accepts under their own name
const DOCUMENT_TEXT_TYPES: &[&str] = &[
    "text/plain",
    "text/html",
    "text/css",
    "text/csv",
    "text/markdown",
    "text/xml",
];

/// Guesses the MIME type of a file from its extension.
///
/// Document text types, images, audio, video and PDF keep their guessed type.
/// Source files (`text/x-rust`, `text/x-python`, ...) and unknown extensions
/// are uploaded as `text/plain`, which the Files API accepts for any UTF-8
/// content.
pub fn mime_type_for(path: &Path) -> String {
    match mime_guess::from_path(path).first() {
        Some(mime) if DOCUMENT_TEXT_TYPES.contains(&mime.essence_str()) => {
            mime.essence_str().to_string()
        }
        Some(mime) if is_binary_document(&mime) => mime.essence_str().to_string(),
        _ => FALLBACK_MIME_TYPE.to_string(),
    }
}

fn is_binary_document(mime: &mime_guess::Mime) -> bool {
    matches!(mime.type_().as_str(), "image" | "audio" | "video")
        || mime.essence_str() == "application/pdf"
}
