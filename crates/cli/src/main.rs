use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use folio_core::widget::chapter_from_path;
use folio_core::{
    ApiClient, ChatRole, ChatWidget, ContentSource, FileStore, FolioConfig, HtmlSource, PersonalizeWidget, Session,
    SignupRequest, SkillLevel, TextSource, TranslateWidget, WidgetState, extract_content, fetch_file, fetch_stdin,
    fetch_url,
};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;
mod prompt;

use prompt::TerminalConfirm;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for `extract`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Extract chapter text from docs pages and send it to the reader-assist backend
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version, about = "Reader-assist tools for documentation sites", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/folio/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend URL, overriding config and FOLIO_API_URL
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Session file (default: <config dir>/folio/session.json)
    #[arg(long, global = true, value_name = "FILE")]
    session: Option<PathBuf>,

    /// Send truncated content without asking
    #[arg(short, long, global = true)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the primary text of a page
    Extract {
        /// URL to fetch, local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Content region selector, tried in order (repeatable)
        #[arg(long = "selector", value_name = "CSS")]
        selectors: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Translate a page
    Translate {
        /// URL to fetch, local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Target language code (default from config: "ur")
        #[arg(short, long, value_name = "LANG")]
        lang: Option<String>,

        /// Treat INPUT as plain text instead of HTML
        #[arg(long)]
        text: bool,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Rewrite a page for a skill level
    Personalize {
        /// URL to fetch, local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// beginner, intermediate or advanced
        #[arg(short, long, value_name = "LEVEL")]
        level: SkillLevel,

        /// Chapter slug (default: derived from the page path)
        #[arg(long, value_name = "CHAPTER")]
        chapter: Option<String>,

        /// Treat INPUT as plain text instead of HTML
        #[arg(long)]
        text: bool,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Ask the book assistant; starts an interactive session without a question
    Chat {
        /// The question; omit for an interactive session
        question: Option<String>,

        /// Page URL or path the question is about
        #[arg(long, value_name = "PAGE")]
        page: Option<String>,

        /// Chapter slug, overriding --page
        #[arg(long, value_name = "CHAPTER")]
        chapter: Option<String>,

        /// Selected text to send as context
        #[arg(long, value_name = "TEXT")]
        select: Option<String>,
    },

    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account and log in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_name = "NAME")]
        name: String,
        #[arg(long, default_value = "beginner")]
        experience: String,
        #[arg(long, default_value = "none")]
        background: String,
        #[arg(long, default_value = "basic_pc")]
        hardware: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Generate a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<FolioConfig> {
    let mut config = FolioConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    debug!(base_url = %config.api.base_url, target_language = %config.target_language, "configuration loaded");
    Ok(config)
}

fn open_session(cli: &Cli) -> anyhow::Result<Session<FileStore>> {
    let path = match &cli.session {
        Some(path) => path.clone(),
        None => FileStore::default_path().context("No config directory found; pass --session <FILE>")?,
    };
    let store = FileStore::open(&path).with_context(|| format!("Failed to open session: {}", path.display()))?;
    Ok(Session::new(store))
}

fn backend(config: &FolioConfig, session: &Session<FileStore>) -> anyhow::Result<ApiClient> {
    let client = ApiClient::new(config.api.clone()).context("Invalid backend URL")?;
    Ok(client.with_token(session.token()))
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

async fn load_page(input: &str, config: &FolioConfig, verbose: bool) -> anyhow::Result<HtmlSource> {
    let html = if input == "-" {
        if verbose {
            echo::print_step(1, 3, "Reading from stdin");
        }
        fetch_stdin().context("Failed to read from stdin")?
    } else if is_url(input) {
        if verbose {
            echo::print_step(1, 3, &format!("Fetching from {}", input.bright_white().underline()));
        }
        fetch_url(input, &config.fetch).await.context("Failed to fetch URL")?
    } else {
        if verbose {
            echo::print_step(1, 3, &format!("Reading from file {}", input.bright_white()));
        }
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?
    };

    if verbose {
        eprintln!("  {} {}\n", "Size:".dimmed(), echo::format_size(html.len()).bright_white());
        echo::print_step(2, 3, "Parsing HTML document");
    }

    let source = if is_url(input) {
        HtmlSource::parse_with_url(&html, input, config.extract.clone())
    } else {
        HtmlSource::parse(&html, config.extract.clone())
    };
    let source = source.context("Failed to parse HTML")?;

    if verbose {
        if let Some(title) = source.document().title() {
            eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        }
        eprintln!();
    }

    Ok(source)
}

/// Load INPUT as a page, or as already-extracted text with `--text`
async fn load_source(
    input: &str, text: bool, config: &FolioConfig, verbose: bool,
) -> anyhow::Result<Box<dyn ContentSource>> {
    if !text {
        return Ok(Box::new(load_page(input, config, verbose).await?));
    }

    let raw = if input == "-" {
        fetch_stdin().context("Failed to read from stdin")?
    } else {
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?
    };
    if verbose {
        eprintln!("  {} {}\n", "Size:".dimmed(), echo::format_size(raw.len()).bright_white());
    }
    Ok(Box::new(TextSource::new(raw)))
}

/// The chapter slug for a page given on the command line
fn chapter_for(page: &str) -> String {
    match Url::parse(page) {
        Ok(url) if is_url(page) => chapter_from_path(url.path()),
        _ => chapter_from_path(page),
    }
}

fn write_output(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", content),
    }
    Ok(())
}

async fn run_extract(
    cli: &Cli, config: &FolioConfig, input: &str, format: OutputFormat, selectors: &[String], output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut extract_config = config.extract.clone();
    if !selectors.is_empty() {
        extract_config.content_selectors = selectors.to_vec();
    }

    let source = load_page(input, config, cli.verbose).await?;
    if cli.verbose {
        echo::print_step(3, 3, "Extracting chapter text");
    }

    let extracted = extract_content(source.document(), &extract_config).context("Failed to extract content")?;
    if cli.verbose {
        echo::print_content_details(&extracted.content, extracted.selector.as_deref());
    }
    if extracted.content.is_empty() {
        bail!("No content found on this page.");
    }

    let rendered = match format {
        OutputFormat::Text => extracted.content.text.clone(),
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&extracted.content).context("Failed to serialize content")?;
            value["selector"] = serde_json::json!(extracted.selector);
            serde_json::to_string_pretty(&value).context("Failed to serialize content")?
        }
    };

    write_output(&rendered, output)
}

async fn run_translate(
    cli: &Cli, config: &FolioConfig, input: &str, lang: Option<&str>, text: bool, output: Option<&Path>,
) -> anyhow::Result<()> {
    let source = load_source(input, text, config, cli.verbose).await?;
    let session = open_session(cli)?;
    let client = backend(config, &session)?;

    let lang = lang.unwrap_or(&config.target_language);
    let mut widget = TranslateWidget::new(lang, config.budget);
    let mut confirm = TerminalConfirm::new(cli.yes);

    if cli.verbose {
        echo::print_step(3, 3, &format!("Translating to {}", lang.bright_white()));
    }

    match widget.run(&client, source.as_ref(), &mut confirm).await {
        WidgetState::Success(translation) => {
            if cli.verbose {
                echo::print_usage(translation.tokens_used, translation.estimated_cost_usd);
            }
            write_output(&translation.content, output)
        }
        WidgetState::Error(message) => bail!("{message}"),
        WidgetState::Idle | WidgetState::Loading => {
            echo::print_warning("Nothing was sent.");
            Ok(())
        }
    }
}

async fn run_personalize(
    cli: &Cli, config: &FolioConfig, input: &str, level: SkillLevel, chapter: Option<&str>, text: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let source = load_source(input, text, config, cli.verbose).await?;
    let session = open_session(cli)?;
    let client = backend(config, &session)?;

    let chapter = match chapter {
        Some(chapter) => chapter.to_string(),
        None => chapter_for(source.page_path().unwrap_or(input)),
    };
    let mut widget = PersonalizeWidget::new(chapter, config.budget);
    let mut confirm = TerminalConfirm::new(cli.yes);

    if cli.verbose {
        echo::print_step(3, 3, &format!("Personalizing {} for {}", widget.chapter(), level.bright_white()));
    }

    match widget.run(&client, level, source.as_ref(), &mut confirm).await {
        WidgetState::Success(personalization) => write_output(&personalization.content, output),
        WidgetState::Error(message) => bail!("{message}"),
        WidgetState::Idle | WidgetState::Loading => {
            echo::print_warning("Nothing was sent.");
            Ok(())
        }
    }
}

/// Send one question and print the assistant's answer
async fn ask(chat: &mut ChatWidget, client: &ApiClient, question: &str, verbose: bool) -> bool {
    let failed = matches!(chat.send(client, question).await, WidgetState::Error(_));

    if let Some(answer) = chat.messages().last().filter(|m| m.role == ChatRole::Assistant) {
        if failed {
            echo::print_error(&answer.content);
        } else {
            println!("{}", answer.content);
        }
    }
    if verbose {
        if let WidgetState::Success(reply) = chat.state() {
            echo::print_sources(&reply.sources);
        }
    }
    !failed
}

async fn run_chat(
    cli: &Cli, config: &FolioConfig, question: Option<&str>, page: Option<&str>, chapter: Option<&str>,
    select: Option<&str>,
) -> anyhow::Result<()> {
    let session = open_session(cli)?;
    let client = backend(config, &session)?;

    let chapter = match (chapter, page) {
        (Some(chapter), _) => chapter.to_string(),
        (None, Some(page)) => chapter_for(page),
        (None, None) => "unknown".to_string(),
    };
    let mut chat = ChatWidget::new(chapter);

    if let Some(text) = select {
        if !chat.select_text(text) {
            echo::print_warning("Selection is too short to use as context; ignored.");
        }
    }

    if let Some(question) = question {
        if !ask(&mut chat, &client, question, cli.verbose).await {
            bail!("Chat request failed");
        }
        return Ok(());
    }

    echo::print_info(&format!(
        "Chatting about {}. Commands: /new, /select <text>, /quit",
        chat.chapter().bright_white()
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                chat.new_chat();
                echo::print_info("Started a new chat");
            }
            _ if line.starts_with("/select ") => {
                if chat.select_text(&line["/select ".len()..]) {
                    echo::print_info("Selection captured");
                } else {
                    echo::print_warning("Selection is too short to use as context; ignored.");
                }
            }
            _ => {
                ask(&mut chat, &client, line, cli.verbose).await;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    if let Command::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "folio", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match &cli.command {
        Command::Extract { input, format, selectors, output } => {
            run_extract(&cli, &config, input, *format, selectors, output.as_deref()).await
        }
        Command::Translate { input, lang, text, output } => {
            run_translate(&cli, &config, input, lang.as_deref(), *text, output.as_deref()).await
        }
        Command::Personalize { input, level, chapter, text, output } => {
            run_personalize(&cli, &config, input, *level, chapter.as_deref(), *text, output.as_deref()).await
        }
        Command::Chat { question, page, chapter, select } => {
            run_chat(&cli, &config, question.as_deref(), page.as_deref(), chapter.as_deref(), select.as_deref()).await
        }
        Command::Login { email, password } => {
            let mut session = open_session(&cli)?;
            let client = backend(&config, &session)?;
            let user = session.login(&client, email, password).await.context("Login failed")?;
            echo::print_success(&format!("Logged in as {}", user.name.bright_white()));
            Ok(())
        }
        Command::Signup { email, password, name, experience, background, hardware } => {
            let mut session = open_session(&cli)?;
            let client = backend(&config, &session)?;
            let request = SignupRequest {
                programming_experience: experience.clone(),
                robotics_background: background.clone(),
                hardware_access: hardware.clone(),
                ..SignupRequest::new(email, password, name)
            };
            let user = session.signup(&client, &request).await.context("Signup failed")?;
            echo::print_success(&format!("Account created; logged in as {}", user.name.bright_white()));
            Ok(())
        }
        Command::Logout => {
            let mut session = open_session(&cli)?;
            session.clear().context("Failed to clear session")?;
            echo::print_success("Logged out");
            Ok(())
        }
        Command::Whoami => {
            let session = open_session(&cli)?;
            match session.load() {
                Some(user) => echo::print_user(&user),
                None => echo::print_info("Not logged in"),
            }
            Ok(())
        }
        Command::Completions { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_chapter_for_url_and_path() {
        assert_eq!(chapter_for("https://book.example.com/docs/module-1/intro"), "module-1/intro");
        assert_eq!(chapter_for("site/docs/module-2/slam.html"), "module-2/slam.html");
        assert_eq!(chapter_for("https://book.example.com/"), "unknown");
    }

    #[test]
    fn test_level_parses_from_args() {
        let cli = Cli::try_parse_from(["folio", "personalize", "page.html", "--level", "Advanced"]).unwrap();
        assert!(matches!(cli.command, Command::Personalize { level: SkillLevel::Advanced, .. }));
    }
}
