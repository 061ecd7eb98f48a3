pub mod command;
pub mod composer;
pub mod context;
pub mod conversation_state;
pub mod faq;
pub mod language;
pub mod prompt;
pub mod search;

use std::io::Write;
use std::process::ExitCode;

use color_print::cformat;
use command::Command;
use composer::PromptComposer;
use context::SessionContext;
use conversation_state::{ConversationState, Role};
use eyre::{bail, Result};
use faq::FaqStore;
use language::{LanguageMode, NepaliLexicon};
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use search::WebSearcher;
use tracing::{debug, error, warn};

use crate::gemini_client::{GeminiClient, GenerationService};

const WELCOME_TEXT: &str = "
नमस्ते! म तपाईंलाई कसरी मद्दत गर्न सक्छु?
I'm Kancha, your Nepali-English chat saathi.

Things to try
• k cha khabar? (write Romanized Nepali, get Nepglish back)
• आजको मौसम कस्तो छ? (Devanagari in, Devanagari out)
• Who is the current PM of Nepal? (recent questions get a web check)

/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Kancha Chat CLI

/clear        Clear the conversation history
/history      Show the conversation so far
/help         Show this help dialogue
/quit         Quit the application (also /exit, /q)

Kancha replies in the language you use: English gets English, Romanized
Nepali gets Nepglish, and Devanagari gets Devanagari.
";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    no_search: bool,
    conversation_state: ConversationState,
    lexicon: NepaliLexicon,
    faq: FaqStore,
    composer: PromptComposer,
    searcher: Option<WebSearcher>,
    service: Option<Box<dyn GenerationService>>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        no_search: bool,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            no_search,
            conversation_state: ConversationState::new(),
            lexicon: NepaliLexicon::load_default(),
            faq: FaqStore::load_default(),
            composer: PromptComposer::new(SessionContext::new()),
            searcher: None,
            service: None,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // A missing API key ends the session before any prompt is taken.
        self.service = match GeminiClient::new() {
            Ok(client) => Some(Box::new(client)),
            Err(e) => {
                writeln!(self.output, "Failed to initialize Gemini client: {}", e)?;
                return Ok(ExitCode::FAILURE);
            }
        };

        if !self.no_search {
            match WebSearcher::new() {
                Ok(searcher) => self.searcher = Some(searcher),
                Err(e) => warn!("Web search unavailable: {}", e),
            }
        }

        if self.interactive {
            self.print_welcome()?;
        }

        // Handle non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            self.handle_input(&input).await?;
            return Ok(ExitCode::SUCCESS);
        }

        // Interactive mode
        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(None);

            match rl.readline(&prompt_text) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    match command::parse(&line) {
                        Command::Quit => {
                            writeln!(self.output, "Pheri bhetaula! 👋")?;
                            break;
                        }
                        command => {
                            if let Err(e) = self.handle_command(command).await {
                                writeln!(self.output, "Error: {}", e)?;
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    writeln!(self.output, "Pheri bhetaula! 👋")?;
                    break;
                }
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        prompt::save_history(&mut rl);
        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        self.handle_command(command::parse(input)).await
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => writeln!(self.output, "{}", HELP_TEXT)?,
            Command::Clear => {
                self.conversation_state.clear();
                writeln!(self.output, "Conversation cleared.")?;
            }
            Command::History => self.print_history()?,
            // The interactive loop breaks on Quit before reaching here; in
            // single-query mode it is a no-op.
            Command::Quit => {}
            Command::Unknown(line) => {
                writeln!(self.output, "Unknown command: {}. Try /help.", line)?;
            }
            Command::Ask(text) => self.process_chat_input(&text).await?,
        }

        Ok(())
    }

    async fn process_chat_input(&mut self, input: &str) -> Result<()> {
        let mode = self.lexicon.classify(input);
        debug!("Detected language mode {} for input {:?}", mode, input);
        self.print_user_bubble(input, mode)?;

        // FAQ fast path: canned answers skip both search and the model.
        let faq_answer = self.faq.lookup(input, mode).map(str::to_string);
        if let Some(answer) = faq_answer {
            debug!("FAQ hit for {:?}", input);
            self.conversation_state.add_user_message(input, mode);
            self.print_assistant_bubble(&answer)?;
            self.conversation_state.add_assistant_message(&answer);
            return Ok(());
        }

        let search_context = match &self.searcher {
            Some(searcher) if search::needs_web_search(input) => {
                writeln!(self.output, "{}", cformat!("<dim>Searching the web...</dim>"))?;
                searcher.search_context(input).await
            }
            _ => None,
        };

        let prompt = self.composer.compose(
            mode,
            input,
            self.conversation_state.messages(),
            search_context.as_deref(),
        );
        self.conversation_state.add_user_message(input, mode);

        let service = match &self.service {
            Some(service) => service,
            None => bail!("generation service not initialized"),
        };

        let result = service.generate(&prompt).await;
        match result {
            Ok(reply) => {
                self.print_assistant_bubble(&reply)?;
                self.conversation_state.add_assistant_message(&reply);
            }
            Err(e) => {
                // The user's message stays in history; the turn simply has
                // no reply.
                error!("Generation failed: {}", e);
                self.print_error_bubble(&e.to_string())?;
            }
        }

        Ok(())
    }

    fn print_user_bubble(&mut self, text: &str, mode: LanguageMode) -> Result<()> {
        writeln!(
            self.output,
            "{}",
            cformat!("<green><bold>You</bold></green> <dim>[{}]</dim>", mode)
        )?;
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    fn print_assistant_bubble(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", cformat!("<cyan><bold>Kancha</bold></cyan>"))?;
        writeln!(self.output, "{}", text)?;
        writeln!(self.output, "{}", rule_line())?;
        Ok(())
    }

    fn print_error_bubble(&mut self, text: &str) -> Result<()> {
        writeln!(
            self.output,
            "{}",
            cformat!("<red><bold>Kancha (error)</bold></red>")
        )?;
        writeln!(self.output, "{}", text)?;
        writeln!(self.output, "{}", rule_line())?;
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        if self.conversation_state.is_empty() {
            writeln!(self.output, "No conversation yet.")?;
            return Ok(());
        }

        for message in self.conversation_state.messages() {
            let header = match (message.role, message.detected_mode) {
                (Role::User, Some(mode)) => {
                    cformat!("<green><bold>You</bold></green> <dim>[{}]</dim>", mode)
                }
                (Role::User, None) => cformat!("<green><bold>You</bold></green>"),
                (Role::Assistant, _) => cformat!("<cyan><bold>Kancha</bold></cyan>"),
            };
            writeln!(self.output, "{}", header)?;
            writeln!(self.output, "{}", message.text)?;
            writeln!(self.output)?;
        }

        Ok(())
    }
}

/// Separator sized to the terminal, clamped so very wide terminals do not
/// get a wall-to-wall line.
fn rule_line() -> String {
    let width = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80);
    "─".repeat(width.clamp(20, 100))
}
