use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

mod render;

use gemx::contexts::{
    ChatSession, DirectoryWriter, DryRunWriter, FilenameResolver, GenerativeModel,
    ResponseExtractor,
};
use gemx::data::gemini::{FileData, GenerateContentResponse, Part};
use gemx::data::FileSink;
use gemx::registries::LanguageRegistry;
use gemx::settings::{Settings, DEFAULT_MODEL, SETTINGS_FILE};
use render::BoldRenderer;

#[derive(Clone, Copy)]
pub struct Config {
    pub dry_run: bool,
}

const DEFAULT_FILE_PROMPT: &str = "Describe the contents of this file.";
const SUMMARIZE_PROMPT: &str = "Provide a concise summary of the content of this file.";
const CODE_EXPLAINER_PROMPT: &str =
    "Explain the code in this file step-by-step, focusing on its purpose and key logic.";

/// Extractor writing into the working directory, or nowhere in dry-run mode
pub fn build_extractor(config: &Config) -> ResponseExtractor<Box<dyn FileSink>> {
    let sink: Box<dyn FileSink> = if config.dry_run {
        Box::new(DryRunWriter)
    } else {
        Box::new(DirectoryWriter::new(None))
    };
    ResponseExtractor::new(FilenameResolver::new(LanguageRegistry::default()), sink)
}

pub fn ensure_initialized(settings: &Settings) -> Result<()> {
    if !settings.init_done {
        anyhow::bail!("CLI not initialized. Please run the 'init' command first.");
    }
    Ok(())
}

/// Interactive first-time setup
pub fn initialize(settings: &Settings) -> Result<()> {
    let stdin = io::stdin();
    initialize_with(settings, &mut stdin.lock(), Path::new(SETTINGS_FILE))
}

fn initialize_with<R: BufRead>(settings: &Settings, input: &mut R, path: &Path) -> Result<()> {
    if settings.init_done {
        println!("You have already completed the initialization process.");
        return Ok(());
    }
    println!("Initializing configuration...");

    let name = read_input(input, "What is your name (leave blank for anonymous): ")
        .unwrap_or_else(|e| {
            log::warn!("could not read name: {:#}", e);
            String::new()
        });

    let api_key = read_input(input, "Please enter your Gemini API key (required): ")
        .ok()
        .filter(|key| !key.is_empty())
        .context("API key is required and could not be read.")?;

    let mut model = read_input(
        input,
        &format!(
            "Enter default Gemini model (e.g., {}) [leave blank for default]: ",
            DEFAULT_MODEL
        ),
    )
    .unwrap_or_else(|e| {
        log::warn!("could not read model name: {:#}", e);
        String::new()
    });
    if model.is_empty() {
        model = DEFAULT_MODEL.to_string();
        println!("Using default model: {}", model);
    }

    let settings = Settings {
        name,
        api_key,
        model,
        init_done: true,
    };
    settings.save_to(path)?;

    println!("Configuration saved successfully to {}", path.display());
    Ok(())
}

pub fn set_api_key(settings: &Settings, api_key: &str) -> Result<()> {
    set_api_key_at(settings, api_key, Path::new(SETTINGS_FILE))
}

fn set_api_key_at(settings: &Settings, api_key: &str, path: &Path) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let mut updated = settings.clone();
    updated.api_key = api_key.to_string();
    updated.save_to(path)?;

    println!("API Key updated successfully.");
    Ok(())
}

pub fn set_model<M: GenerativeModel + ?Sized>(
    settings: &Settings,
    backend: &M,
    model: &str,
) -> Result<()> {
    set_model_at(settings, backend, model, Path::new(SETTINGS_FILE))
}

fn set_model_at<M: GenerativeModel + ?Sized>(
    settings: &Settings,
    backend: &M,
    model: &str,
    path: &Path,
) -> Result<()> {
    let model = model.trim().to_lowercase();
    let model = model.strip_prefix("models/").unwrap_or(&model);

    let available = backend
        .list_models()
        .context("Failed to list available models")?;

    if !available.iter().any(|info| info.short_name() == model) {
        let names: Vec<&str> = available.iter().map(|info| info.short_name()).collect();
        anyhow::bail!(
            "Invalid model name: {}\nAvailable models are:\n  {}",
            model,
            names.join("\n  ")
        );
    }

    let mut updated = settings.clone();
    updated.model = model.to_string();
    updated.save_to(path)?;

    println!("Default model successfully set to {}", model);
    Ok(())
}

/// Maps the words after `file <path>` to the prompt actually sent
pub fn file_prompt(words: &[String], path: &Path) -> String {
    let prompt = words.join(" ");
    match prompt.as_str() {
        "" => {
            println!(
                "No specific prompt provided for file '{}'. Using default prompt: '{}'",
                path.display(),
                DEFAULT_FILE_PROMPT
            );
            DEFAULT_FILE_PROMPT.to_string()
        }
        "summarize" => SUMMARIZE_PROMPT.to_string(),
        "code-explainer" => CODE_EXPLAINER_PROMPT.to_string(),
        _ => prompt,
    }
}

/// Sends one prompt (optionally with a file), streams the answer to stdout
/// and saves any code blocks it contains.
pub fn send_message<M, S>(
    session: &mut ChatSession<'_, M>,
    extractor: &mut ResponseExtractor<S>,
    prompt: &str,
    file: Option<&Path>,
) -> Result<()>
where
    M: GenerativeModel + ?Sized,
    S: FileSink,
{
    let mut parts = vec![Part::text(prompt)];

    if let Some(path) = file {
        if !path.exists() {
            anyhow::bail!("file not found: {}", path.display());
        }

        println!("Uploading file: {}...", path.display());
        let uploaded = session
            .backend()
            .upload_file(path)
            .with_context(|| format!("error uploading file '{}'", path.display()))?;
        println!("File uploaded successfully! URI: {}", uploaded.uri);

        parts.insert(
            0,
            Part::file(FileData {
                mime_type: uploaded.mime_type,
                file_uri: uploaded.uri,
            }),
        );
    }

    println!("You: {}", prompt);
    println!("Gemini thinking...");
    print!("Gemini: ");
    let _ = io::stdout().flush();

    let mut renderer = BoldRenderer::default();
    let response = session
        .send(parts, &mut |text: &str| {
            print!("{}", renderer.render(text));
            let _ = io::stdout().flush();
        })
        .context("error sending message")?;
    println!("{}", renderer.finish());

    if has_content(&response) {
        let report = extractor.process_response(&response);
        log::debug!(
            "extraction finished: {} saved, {} skipped, {} failed",
            report.saved.len(),
            report.skipped.len(),
            report.failed.len()
        );
    } else {
        report_missing_content(&response);
    }

    Ok(())
}

fn has_content(response: &GenerateContentResponse) -> bool {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .is_some_and(|content| !content.parts.is_empty())
}

fn report_missing_content(response: &GenerateContentResponse) {
    println!("Received no response content or response was blocked.");

    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            println!("Prompt Feedback Block Reason: {}", reason);
        }
        for rating in &feedback.safety_ratings {
            println!(
                "  Safety Rating - Category: {}, Probability: {}",
                rating.category, rating.probability
            );
        }
    }

    if let Some(reason) = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
        .filter(|reason| *reason != "STOP")
    {
        println!("Candidate Finish Reason: {}", reason);
    }
}

/// Interactive chat on stdin until `exit`, `quit` or end of input
pub fn chat<M, S>(session: &mut ChatSession<'_, M>, extractor: &mut ResponseExtractor<S>) -> Result<()>
where
    M: GenerativeModel + ?Sized,
    S: FileSink,
{
    let stdin = io::stdin();
    chat_with(session, extractor, &mut stdin.lock())
}

fn chat_with<M, S, R>(
    session: &mut ChatSession<'_, M>,
    extractor: &mut ResponseExtractor<S>,
    input: &mut R,
) -> Result<()>
where
    M: GenerativeModel + ?Sized,
    S: FileSink,
    R: BufRead,
{
    println!("Entering interactive chat mode (type 'exit' or 'quit' to end).");

    loop {
        print!("You: ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read user input")?;
        if read == 0 {
            println!();
            println!("Exiting chat.");
            break;
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            println!("Exiting chat.");
            break;
        }
        if line.is_empty() {
            continue;
        }

        if let Err(e) = send_message(session, extractor, line, None) {
            eprintln!("Error during chat: {:#}", e);
        }
    }

    Ok(())
}

fn read_input<R: BufRead>(input: &mut R, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("error reading input")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemx::contexts::GeminiError;
    use gemx::data::gemini::{Candidate, Content, ModelInfo, UploadedFile};
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::io::Cursor;

    /// Replays canned replies; `Ok("")` stands for a blocked prompt
    struct FakeModel {
        replies: RefCell<Vec<Result<&'static str, &'static str>>>,
        requests: Cell<usize>,
    }

    impl FakeModel {
        fn new(replies: Vec<Result<&'static str, &'static str>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                requests: Cell::new(0),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.get()
        }
    }

    impl GenerativeModel for FakeModel {
        fn stream_generate(
            &self,
            _model: &str,
            _contents: &[Content],
            on_text: &mut dyn FnMut(&str),
        ) -> Result<GenerateContentResponse, GeminiError> {
            self.requests.set(self.requests.get() + 1);

            match self.replies.borrow_mut().remove(0) {
                Ok("") => Ok(GenerateContentResponse {
                    candidates: vec![Candidate {
                        content: None,
                        finish_reason: Some("SAFETY".to_string()),
                    }],
                    prompt_feedback: None,
                }),
                Ok(text) => {
                    on_text(text);
                    Ok(GenerateContentResponse {
                        candidates: vec![Candidate {
                            content: Some(Content::model(vec![Part::text(text)])),
                            finish_reason: Some("STOP".to_string()),
                        }],
                        prompt_feedback: None,
                    })
                }
                Err(message) => Err(GeminiError::Api {
                    status: 503,
                    message: message.to_string(),
                }),
            }
        }

        fn upload_file(&self, path: &Path) -> Result<UploadedFile, GeminiError> {
            Ok(UploadedFile {
                name: "files/abc".to_string(),
                uri: format!("https://example.invalid/{}", path.display()),
                mime_type: "text/csv".to_string(),
            })
        }

        fn list_models(&self) -> Result<Vec<ModelInfo>, GeminiError> {
            Ok(vec![
                ModelInfo {
                    name: "models/gemini-2.0-flash-lite".to_string(),
                    display_name: Some("Gemini 2.0 Flash-Lite".to_string()),
                },
                ModelInfo {
                    name: "models/gemini-2.0-flash".to_string(),
                    display_name: None,
                },
            ])
        }
    }

    fn extractor_in(dir: &Path) -> ResponseExtractor<DirectoryWriter> {
        ResponseExtractor::new(
            FilenameResolver::new(LanguageRegistry::default()),
            DirectoryWriter::new(Some(dir.to_path_buf())),
        )
    }

    #[test]
    fn initializes_settings_from_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let mut input = Cursor::new("Ada\nsecret-key\n\n");

        initialize_with(&Settings::default(), &mut input, &path).unwrap();

        let saved = Settings::load_from(&path).unwrap();
        assert_eq!(saved.name, "Ada");
        assert_eq!(saved.api_key, "secret-key");
        assert_eq!(saved.model, DEFAULT_MODEL);
        assert!(saved.init_done);
    }

    #[test]
    fn initialization_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let mut input = Cursor::new("Ada\n\n\n");

        assert!(initialize_with(&Settings::default(), &mut input, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn initialization_is_not_repeated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = Settings {
            init_done: true,
            ..Settings::default()
        };

        initialize_with(&settings, &mut Cursor::new(""), &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn uninitialized_settings_are_rejected() {
        assert!(ensure_initialized(&Settings::default()).is_err());
    }

    #[test]
    fn updates_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        set_api_key_at(&Settings::default(), " new-key ", &path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap().api_key, "new-key");
    }

    #[test]
    fn sets_known_model_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let backend = FakeModel::new(vec![]);

        set_model_at(&Settings::default(), &backend, "Gemini-2.0-Flash-Lite", &path).unwrap();
        assert_eq!(
            Settings::load_from(&path).unwrap().model,
            "gemini-2.0-flash-lite"
        );
    }

    #[test]
    fn rejects_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let backend = FakeModel::new(vec![]);

        let err = set_model_at(&Settings::default(), &backend, "gpt-4", &path).unwrap_err();
        assert!(err.to_string().contains("Invalid model name: gpt-4"));
        assert!(!path.exists());
    }

    #[test]
    fn maps_file_prompt_shortcuts() {
        let path = Path::new("notes.txt");
        assert_eq!(file_prompt(&[], path), DEFAULT_FILE_PROMPT);
        assert_eq!(file_prompt(&["summarize".to_string()], path), SUMMARIZE_PROMPT);
        assert_eq!(
            file_prompt(&["code-explainer".to_string()], path),
            CODE_EXPLAINER_PROMPT
        );
        assert_eq!(
            file_prompt(&["what".to_string(), "is".to_string(), "this".to_string()], path),
            "what is this"
        );
    }

    #[test]
    fn send_message_saves_code_from_reply() {
        let dir = tempfile::tempdir().unwrap();
        let backend =
            FakeModel::new(vec![Ok("Sure:\n```python\nprint(1)\n```\nFilename: hello.py\n")]);
        let mut session = ChatSession::new(&backend, DEFAULT_MODEL);
        let mut extractor = extractor_in(dir.path());

        send_message(&mut session, &mut extractor, "write hello", None).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("hello.py")).unwrap(), "print(1)");
    }

    #[test]
    fn send_message_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeModel::new(vec![Ok("unused")]);
        let mut session = ChatSession::new(&backend, DEFAULT_MODEL);
        let mut extractor = extractor_in(dir.path());

        let err = send_message(
            &mut session,
            &mut extractor,
            "describe",
            Some(&dir.path().join("absent.txt")),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("file not found"));
    }

    #[test]
    fn send_message_puts_file_part_first() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.csv");
        fs::write(&file, "a,b\n1,2\n").unwrap();

        let backend = FakeModel::new(vec![Ok("It is a CSV.")]);
        let mut session = ChatSession::new(&backend, DEFAULT_MODEL);
        let mut extractor = extractor_in(dir.path());

        send_message(&mut session, &mut extractor, "describe", Some(&file)).unwrap();

        let parts = &session.history()[0].parts;
        assert!(parts[0].file_data.is_some());
        assert_eq!(parts[1].text.as_deref(), Some("describe"));
    }

    #[test]
    fn chat_continues_after_errors_and_stops_on_quit() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeModel::new(vec![Err("overloaded"), Ok("fine")]);
        let mut session = ChatSession::new(&backend, DEFAULT_MODEL);
        let mut extractor = extractor_in(dir.path());
        let mut input = Cursor::new("first\n\nsecond\nQUIT\nnever sent\n");

        chat_with(&mut session, &mut extractor, &mut input).unwrap();

        assert_eq!(backend.request_count(), 2);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn blocked_reply_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeModel::new(vec![Ok("")]);
        let mut session = ChatSession::new(&backend, DEFAULT_MODEL);
        let mut extractor = extractor_in(dir.path());

        send_message(&mut session, &mut extractor, "hi", None).unwrap();
        assert!(session.history().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
