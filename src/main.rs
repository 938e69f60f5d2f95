use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use gemx::contexts::{ChatSession, GeminiClient};
use gemx::settings::{Settings, DEFAULT_MODEL};

mod cli;

#[derive(Parser)]
#[command(name = "gemx", version)]
#[command(about = "Send prompts and files to Gemini and save the code it writes", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(help = "Prompt to send when no subcommand is given")]
    prompt: Vec<String>,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Report extracted files without writing them")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Initialize the CLI tool (required before first use)")]
    Init,

    #[command(about = "Set or update the Gemini API key")]
    SetApiKey {
        #[arg(help = "The new API key")]
        api_key: String,
    },

    #[command(about = "Set the default Gemini model")]
    SetModel {
        #[arg(help = "Model name, e.g. gemini-2.0-flash-lite")]
        model: String,
    },

    #[command(about = "Send a file to Gemini with an optional prompt ('summarize' and 'code-explainer' are shortcuts)")]
    File {
        #[arg(help = "Path of the file to upload")]
        path: PathBuf,

        #[arg(help = "Prompt to send along with the file", trailing_var_arg = true)]
        prompt: Vec<String>,
    },

    #[command(about = "Enter interactive chat mode")]
    Chat,

    #[command(about = "Send a text prompt to Gemini")]
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "gemx=debug" } else { "gemx=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli::Config {
        dry_run: cli.dry_run,
    };

    let command = match cli.command {
        Some(command) => command,
        None if !cli.prompt.is_empty() => Commands::Ask { prompt: cli.prompt },
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    let settings = Settings::load()?;
    if !matches!(command, Commands::Init) {
        cli::ensure_initialized(&settings)?;
    }

    match command {
        Commands::Init => cli::initialize(&settings)?,
        Commands::SetApiKey { api_key } => cli::set_api_key(&settings, &api_key)?,
        Commands::SetModel { model } => {
            let client = connect(&settings)?;
            cli::set_model(&settings, &client, &model)?;
        }
        Commands::File { path, prompt } => {
            let client = connect(&settings)?;
            let mut session = ChatSession::new(&client, model_name(&settings));
            let mut extractor = cli::build_extractor(&config);

            let prompt = cli::file_prompt(&prompt, &path);
            cli::send_message(&mut session, &mut extractor, &prompt, Some(&path))?;
        }
        Commands::Chat => {
            let client = connect(&settings)?;
            let mut session = ChatSession::new(&client, model_name(&settings));
            let mut extractor = cli::build_extractor(&config);

            cli::chat(&mut session, &mut extractor)?;
        }
        Commands::Ask { prompt } => {
            let client = connect(&settings)?;
            let mut session = ChatSession::new(&client, model_name(&settings));
            let mut extractor = cli::build_extractor(&config);

            cli::send_message(&mut session, &mut extractor, &prompt.join(" "), None)?;
        }
    }

    Ok(())
}

fn connect(settings: &Settings) -> Result<GeminiClient> {
    let api_key = settings
        .effective_api_key()
        .context("API key is missing in config.json. Please run 'init' again.")?;
    GeminiClient::new(api_key, None).context("Error creating Gemini client")
}

fn model_name(settings: &Settings) -> &str {
    if settings.model.is_empty() {
        log::warn!("Model name missing in config, using default: {}", DEFAULT_MODEL);
    }
    log::debug!("using model {}", settings.effective_model());
    settings.effective_model()
}
