use crate::data::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, ListModelsResponse, ModelInfo,
    UploadFileResponse, UploadedFile,
};
use crate::registries::mime_type_for;
use reqwest::blocking::{Client, Response};
use serde_json::json;
use std::fmt;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors that can occur while talking to the Gemini API
#[derive(Debug)]
pub enum GeminiError {
    Http(reqwest::Error),
    Api { status: u16, message: String },
    InvalidResponse(String),
    File(String),
}

impl fmt::Display for GeminiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeminiError::Http(e) => write!(f, "Request failed: {}", e),
            GeminiError::Api { status, message } => {
                write!(f, "API returned status {}: {}", status, message)
            }
            GeminiError::InvalidResponse(details) => {
                write!(f, "Unexpected response from API: {}", details)
            }
            GeminiError::File(details) => write!(f, "{}", details),
        }
    }
}

impl std::error::Error for GeminiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeminiError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        GeminiError::Http(e)
    }
}

/// Operations the CLI needs from a generative model backend
pub trait GenerativeModel {
    /// Streams a completion for `contents`, calling `on_text` with each chunk
    /// of text as it arrives, and returns the merged response.
    fn stream_generate(
        &self,
        model: &str,
        contents: &[Content],
        on_text: &mut dyn FnMut(&str),
    ) -> Result<GenerateContentResponse, GeminiError>;

    /// Uploads a local file so it can be referenced from a prompt
    fn upload_file(&self, path: &Path) -> Result<UploadedFile, GeminiError>;

    /// Lists every model available to the configured key
    fn list_models(&self) -> Result<Vec<ModelInfo>, GeminiError>;
}

/// Blocking client for the Gemini `v1beta` REST API
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new GeminiClient
    ///
    /// # Arguments
    /// * `api_key` - Key sent with every request
    /// * `base_url` - Optional API root (defaults to the public endpoint)
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, GeminiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }
}

impl GenerativeModel for GeminiClient {
    fn stream_generate(
        &self,
        model: &str,
        contents: &[Content],
        on_text: &mut dyn FnMut(&str),
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/v1beta/{}:streamGenerateContent?alt=sse",
            self.base_url,
            Self::model_path(model)
        );
        log::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest { contents })
            .send()?;
        let response = ensure_success(response)?;

        read_event_stream(BufReader::new(response), on_text)
    }

    fn upload_file(&self, path: &Path) -> Result<UploadedFile, GeminiError> {
        let bytes = fs::read(path)
            .map_err(|e| GeminiError::File(format!("Failed to read {}: {}", path.display(), e)))?;
        let mime_type = mime_type_for(path);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type.as_str())
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()?;
        let start = ensure_success(start)?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                GeminiError::InvalidResponse("missing x-goog-upload-url header".to_string())
            })?;

        let finished = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()?;
        let finished = ensure_success(finished)?;

        let uploaded: UploadFileResponse = finished.json()?;
        Ok(uploaded.file)
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, GeminiError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}/v1beta/models?pageSize=1000", self.base_url);
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(token);
            }

            let response = self
                .http
                .get(&url)
                .header("x-goog-api-key", &self.api_key)
                .send()?;
            let page: ListModelsResponse = ensure_success(response)?.json()?;

            models.extend(page.models);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }
}

/// Turns non-2xx responses into `GeminiError::Api`, preferring the message
/// from the API's error envelope.
fn ensure_success(response: Response) -> Result<Response, GeminiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(GeminiError::Api {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Reads a server-sent event stream of `GenerateContentResponse` chunks.
///
/// Only `data:` lines are interpreted; blank lines, comments and other
/// fields are ignored.
pub fn read_event_stream<R: BufRead>(
    reader: R,
    on_text: &mut dyn FnMut(&str),
) -> Result<GenerateContentResponse, GeminiError> {
    let mut merged = GenerateContentResponse::default();

    for line in reader.lines() {
        let line = line.map_err(|e| {
            GeminiError::InvalidResponse(format!("Failed to read response stream: {}", e))
        })?;

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }

        let chunk: GenerateContentResponse = serde_json::from_str(data).map_err(|e| {
            GeminiError::InvalidResponse(format!("Failed to parse stream chunk: {}", e))
        })?;

        let text = chunk.text();
        if !text.is_empty() {
            on_text(&text);
        }
        merged.merge_chunk(chunk);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_chunks_in_order() {
        let stream = concat!(
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"```rust\\n\"}]}}]}\n",
            "\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"fn main() {}\\n```\"}]},\"finishReason\":\"STOP\"}]}\n",
            "\n",
        );

        let mut seen = Vec::new();
        let merged = read_event_stream(Cursor::new(stream), &mut |t: &str| seen.push(t.to_string())).unwrap();

        assert_eq!(seen, vec!["```rust\n", "fn main() {}\n```"]);
        assert_eq!(merged.text(), "```rust\nfn main() {}\n```");
        assert_eq!(merged.candidates[0].finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn ignores_non_data_lines() {
        let stream = ": keep-alive\nevent: message\ndata: {\"candidates\":[]}\n";
        let merged = read_event_stream(Cursor::new(stream), &mut |_: &str| {}).unwrap();
        assert!(merged.candidates.is_empty());
    }

    #[test]
    fn rejects_malformed_chunks() {
        let result = read_event_stream(Cursor::new("data: {not json}\n"), &mut |_: &str| {});
        assert!(matches!(result, Err(GeminiError::InvalidResponse(_))));
    }

    #[test]
    fn extracts_api_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid.");
        assert_eq!(api_error_message("  plain failure \n"), "plain failure");
    }

    #[test]
    fn prefixes_model_path() {
        assert_eq!(GeminiClient::model_path("gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(GeminiClient::model_path("models/gemini-pro"), "models/gemini-pro");
    }
}
