use std::borrow::Cow::{self, Borrowed, Owned};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use vita_core::conversation::SessionRegistry;
use vita_core::{ChatRunner, ContextRetriever, MetadataFilter, PromptTemplate, VitaError};
use vita_execution::chat_loop::{ASSISTANT_LABEL, QUIT_COMMANDS};
use vita_execution::{ChatLoop, LineSource, LoopExit, init_logging};
use vita_infrastructure::{ProcessEnv, load_config};
use vita_interaction::{OpenAiChatCompleter, OpenAiEmbedder, PineconeVectorStore};

/// Rustyline helper that completes and highlights the quit commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: QUIT_COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }

    fn is_command(&self, line: &str) -> bool {
        self.commands.iter().any(|cmd| line.trim().eq_ignore_ascii_case(cmd))
    }

    /// Commands starting with `prefix`, ignoring case like [`Self::is_command`].
    fn matching<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a String> {
        let prefix = prefix.to_ascii_lowercase();
        self.commands
            .iter()
            .filter(move |cmd| !prefix.is_empty() && cmd.starts_with(&prefix))
    }

    /// Rest of the first command completing `line`.
    fn hint_for(&self, line: &str) -> Option<String> {
        self.matching(line)
            .find(|cmd| cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = self
            .matching(&line[..pos])
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.is_command(line) {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        self.hint_for(&line[..pos])
    }
}

impl Validator for CliHelper {}

/// Terminal line source. Ctrl-D ends the conversation, Ctrl-C aborts it.
struct TerminalInput {
    editor: Editor<CliHelper, DefaultHistory>,
}

impl TerminalInput {
    fn new() -> Result<Self> {
        let mut editor = Editor::<CliHelper, DefaultHistory>::new()
            .context("failed to open the terminal")?;
        editor.set_helper(Some(CliHelper::new()));
        Ok(Self { editor })
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> vita_core::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Err(VitaError::input_stream("interrupted")),
            Err(err) => Err(VitaError::input_stream(err.to_string())),
        }
    }
}

async fn run() -> Result<()> {
    init_logging()?;

    let env = ProcessEnv::with_dotenv()?;
    let config = load_config(&env)?;

    let embedder = Arc::new(OpenAiEmbedder::from_config(&config.provider, &config.embedding));
    let store = Arc::new(PineconeVectorStore::from_config(&config.vector_store));
    let completer = Arc::new(OpenAiChatCompleter::from_config(&config.provider, &config.chat));
    let template = PromptTemplate::default().with_window(config.retrieval.history_window);
    let retriever = Arc::new(ContextRetriever::new(
        embedder.clone(),
        store.clone(),
        MetadataFilter::source(config.retrieval.context_source.clone()),
    ));

    tracing::info!(
        provider = ?config.provider.flavor,
        embedding_model = embedder.model(),
        chat_model = completer.model(),
        index = store.index_name(),
        source = retriever.filter().source_value(),
        history_window = ?template.window(),
        "assistant ready"
    );

    let runner = Arc::new(ChatRunner::new(
        completer,
        template,
        Arc::new(SessionRegistry::new()),
    ));

    let chat = ChatLoop::new(retriever, runner)
        .with_assistant_label(ASSISTANT_LABEL.bright_blue().bold().to_string());

    println!("{}", "=== Vita health assistant ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask about nutrition, exercise or general health. Type 'quit' or press Ctrl-D to leave."
            .bright_black()
    );
    println!();

    let summary = chat.run(TerminalInput::new()?, &mut std::io::stdout()).await?;
    if summary.exit == LoopExit::Quit {
        println!("{}", "Goodbye!".bright_green());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format!("Error: {err:#}").red());
            ExitCode::FAILURE
        }
    }
}
